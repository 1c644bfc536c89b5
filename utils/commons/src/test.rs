//! Mock entrypoints for `TestHost`, enabled with the `test-mocks` feature.
#[cfg(feature = "test-mocks")]
pub use inner::*;

#[cfg(feature = "test-mocks")]
mod inner {
    use concordium_std::test_infrastructure::MockFn;
    use concordium_std::*;

    /// Mock entrypoint that only accepts parameters of type `D` and replies with `return_value`.
    pub fn parse_and_ok_mock<D: Deserial, S>(
        return_value: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new(move |parameter, _amount, _balance, _state| {
            D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            Ok((false, Some(return_value.clone())))
        })
    }

    /// Same as [parse_and_ok_mock], but traps unless `check` holds for the parsed parameter.
    pub fn parse_and_check_mock<D: Deserial, S>(
        check: impl Fn(&D) -> bool + 'static,
        return_value: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new(move |parameter, _, _, _state| {
            let value =
                D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            if !check(&value) {
                return Err(CallContractError::Trap);
            };
            Ok((false, Some(return_value.clone())))
        })
    }

    /// Mock entrypoint that always rejects.
    pub fn reject_mock<S>() -> MockFn<S> {
        MockFn::new(|_, _, _, _state| -> CallContractResult<()> {
            Err(CallContractError::LogicReject {
                reason: -1,
                return_value: (),
            })
        })
    }
}
