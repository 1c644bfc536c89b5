use commons::{
    ContractBalanceOfQueryParams, ContractBalanceOfQueryResponse, ContractResult,
    CustomContractError, Token, TransferParameter,
};
use concordium_cis2::{
    AdditionalData, BalanceOfQuery, BalanceOfQueryParams, Receiver, TokenAmountU64, Transfer,
    TransferParams,
};
use concordium_std::*;

/// Move one unit of `token` held by `from` to the `to` account.
pub fn transfer_token<T>(
    host: &mut impl HasHost<T>,
    token: &Token,
    from: Address,
    to: AccountAddress,
) -> ContractResult<()> {
    let params: TransferParameter = TransferParams(vec![Transfer {
        token_id: token.id.clone(),
        amount: TokenAmountU64(1),
        from,
        to: Receiver::Account(to),
        data: AdditionalData::empty(),
    }]);

    host.invoke_contract(
        &token.contract,
        &params,
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )?;

    Ok(())
}

/// Ensure `owner` holds at least one unit of `token`.
pub fn ensure_custody<T>(
    host: &impl HasHost<T>,
    token: &Token,
    owner: Address,
) -> ContractResult<()> {
    let params: ContractBalanceOfQueryParams = BalanceOfQueryParams {
        queries: vec![BalanceOfQuery {
            token_id: token.id.clone(),
            address: owner,
        }],
    };

    let mut response = host
        .invoke_contract_read_only(
            &token.contract,
            &params,
            EntrypointName::new_unchecked("balanceOf"),
            Amount::zero(),
        )?
        .ok_or(CustomContractError::Incompatible)?;

    let balances = ContractBalanceOfQueryResponse::deserial(&mut response)
        .map_err(|_| CustomContractError::Incompatible)?;

    match balances.0.first() {
        Some(balance) if balance.0 > 0 => Ok(()),
        Some(_) => Err(CustomContractError::AssetNotInCustody),
        None => Err(CustomContractError::Incompatible),
    }
}

#[concordium_cfg_test]
mod tests {
    use commons::test::{parse_and_check_mock, parse_and_ok_mock, reject_mock};
    use concordium_cis2::TokenIdVec;
    use concordium_std::test_infrastructure::*;

    use super::*;

    const NFT_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const HOUSE: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };
    const USER_1: AccountAddress = AccountAddress([1; 32]);

    fn token() -> Token {
        Token {
            contract: NFT_CONTRACT,
            id: TokenIdVec(vec![1, 2, 3]),
        }
    }

    fn balance_mock<S>(balance: u64) -> MockFn<S> {
        MockFn::new(move |parameter, _, _, _state| {
            ContractBalanceOfQueryParams::deserial(&mut Cursor::new(parameter))
                .map_err(|_| CallContractError::Trap)?;
            Ok((
                false,
                Some(ContractBalanceOfQueryResponse::from(vec![TokenAmountU64(
                    balance,
                )])),
            ))
        })
    }

    #[concordium_test]
    fn test_transfer() {
        let mut host = TestHost::new((), TestStateBuilder::new());

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParameter, _>(
                |params| {
                    params.0.len() == 1
                        && params.0[0].token_id == token().id
                        && params.0[0].from == Address::Contract(HOUSE)
                        && params.0[0].amount == TokenAmountU64(1)
                        && matches!(params.0[0].to, Receiver::Account(USER_1))
                },
                (),
            ),
        );

        let response = transfer_token(&mut host, &token(), Address::Contract(HOUSE), USER_1);

        claim_eq!(response, Ok(()));
    }

    #[concordium_test]
    fn test_transfer_rejected() {
        let mut host = TestHost::new((), TestStateBuilder::new());

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            reject_mock(),
        );

        let response = transfer_token(&mut host, &token(), Address::Contract(HOUSE), USER_1);

        claim_eq!(response, Err(CustomContractError::AssetTransferFailed));
    }

    #[concordium_test]
    fn test_custody() {
        let mut host = TestHost::new((), TestStateBuilder::new());

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            balance_mock(1),
        );
        claim_eq!(
            ensure_custody(&host, &token(), Address::Contract(HOUSE)),
            Ok(())
        );

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            balance_mock(0),
        );
        claim_eq!(
            ensure_custody(&host, &token(), Address::Contract(HOUSE)),
            Err(CustomContractError::AssetNotInCustody)
        );
    }

    #[concordium_test]
    fn test_custody_query_rejected() {
        let mut host = TestHost::new((), TestStateBuilder::new());

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            reject_mock(),
        );

        claim_eq!(
            ensure_custody(&host, &token(), Address::Contract(HOUSE)),
            Err(CustomContractError::AssetTransferFailed)
        );
    }

    #[concordium_test]
    fn test_custody_unexpected_response() {
        let mut host = TestHost::new((), TestStateBuilder::new());

        // Answers with no balances at all
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            MockFn::new(|_, _, _, _state| {
                Ok((
                    false,
                    Some(ContractBalanceOfQueryResponse::from(Vec::new())),
                ))
            }),
        );
        claim_eq!(
            ensure_custody(&host, &token(), Address::Contract(HOUSE)),
            Err(CustomContractError::Incompatible)
        );

        // Answers with an empty return value instead of a balance list
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            parse_and_ok_mock::<ContractBalanceOfQueryParams, _>(()),
        );
        claim_eq!(
            ensure_custody(&host, &token(), Address::Contract(HOUSE)),
            Err(CustomContractError::Incompatible)
        );
    }
}
