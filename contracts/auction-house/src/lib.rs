//! An English auction house for CIS-2 tokens.
//!
//! # Description
//! The house holds tokens in custody and auctions them one token per auction.
//! Bids are paid in CCD when placed. A new highest bid refunds the previous
//! highest bidder in the same transaction, and a bid close to the end of an
//! auction extends it by the configured time buffer.
//!
//! Once an auction has ended anyone can settle it: the token is transferred
//! to the winner and the winning bid to the beneficiary. Each settlement price
//! feeds a time weighted average price per token contract.
//!
//! Admins manage the configuration and can pause bidding and auction creation.

#![cfg_attr(not(feature = "std"), no_std)]

mod cis2;
mod config;
mod contract;
mod events;
mod external;
mod price;
mod state;
