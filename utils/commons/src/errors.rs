use super::*;

/// The custom errors the contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Sender lacks the rights for this action (Error code: -4).
    Unauthorized,
    /// Only account addresses can bid (Error code: -5).
    OnlyAccountAddress,
    /// Bidding and auction creation are paused (Error code: -6).
    ContractPaused,
    /// No auction with the given id (Error code: -7).
    UnknownAuction,
    /// The token is already under an unsettled auction (Error code: -8).
    AuctionAlreadyExists,
    /// Auction start time is in the future (Error code: -9).
    AuctionNotStarted,
    /// Bid arrived at or after the auction end time (Error code: -10).
    AuctionEnded,
    /// Bid arrived after the auction was settled (Error code: -11).
    AuctionSettled,
    /// Settlement attempted before the auction end time (Error code: -12).
    AuctionNotEnded,
    /// Settlement attempted on a settled auction (Error code: -13).
    AlreadySettled,
    /// Bid is below the reserve price or the minimum increment (Error code: -14).
    BidTooLow,
    /// Refunding the previous highest bidder failed (Error code: -15).
    RefundFailed,
    /// Paying the proceeds to the beneficiary failed (Error code: -16).
    PayoutFailed,
    /// Moving the auctioned token failed (Error code: -17).
    AssetTransferFailed,
    /// The house does not hold the token it was asked to auction (Error code: -18).
    AssetNotInCustody,
    /// Duration is zero or overflows the timestamp range (Error code: -19).
    InvalidDuration,
    /// Token contract returned an unexpected response (Error code: -20).
    Incompatible,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to CustomContractError.
impl<T> From<CallContractError<T>> for CustomContractError {
    fn from(cce: CallContractError<T>) -> Self {
        match cce {
            CallContractError::MissingEntrypoint | CallContractError::MessageFailed => {
                Self::Incompatible
            }
            _ => Self::AssetTransferFailed,
        }
    }
}
