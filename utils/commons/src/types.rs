use super::*;

pub type ContractResult<A> = Result<A, CustomContractError>;

/// Identifier of an auction, assigned sequentially on creation.
pub type AuctionId = u64;

/// Contract token ID type.
pub type ContractTokenId = TokenIdVec;

/// Contract token amount type.
pub type ContractTokenAmount = TokenAmountU64;

pub type TransferParameter = TransferParams<ContractTokenId, ContractTokenAmount>;

/// Parameter type for the CIS-2 function `balanceOf` specialized to the subset
/// of TokenIDs used by the auctioned token contracts.
pub type ContractBalanceOfQueryParams = BalanceOfQueryParams<ContractTokenId>;

/// Response type for the CIS-2 function `balanceOf` specialized to the subset
/// of TokenAmounts used by the auctioned token contracts.
pub type ContractBalanceOfQueryResponse = BalanceOfQueryResponse<ContractTokenAmount>;
