//! # tickwire
//!
//! OAuth1 request signing and session tracking for polling E*TRADE quotes.
//!
//! This crate is the pure core: it performs no I/O. The HTTP pipeline, the
//! three-legged handshake and the polling loop live in `tickwire-broker`.
//!
//! ## Signing
//!
//! ```
//! use tickwire::oauth::{self, OAuthParams};
//!
//! let params = OAuthParams::template_with("dpf43f3p2l4k3l03", "kllo9940pd9333jh", 1191242096)
//!     .with("oauth_token", "nnch734d00sl2jdk")
//!     .with("oauth_version", "1.0");
//! let query = vec![
//!     ("file".to_string(), "vacation.jpg".to_string()),
//!     ("size".to_string(), "original".to_string()),
//! ];
//! let signed = oauth::sign(
//!     "GET",
//!     "http://photos.example.net/photos",
//!     params,
//!     "kd94hf93k423kf44",
//!     "pfkkdhi9sl3r4s00",
//!     &query,
//! )
//! .unwrap();
//!
//! assert_eq!(signed.get("oauth_signature"), Some("tR3+Ty81lMeYAr/Fid0kMTYa/WM="));
//! ```
//!
//! ## Session tracking
//!
//! | poll | `had_open_hours` | `done` |
//! |------|------------------|--------|
//! | regular | true | false |
//! | extended, after a regular poll | true | **true** |
//! | extended, no regular poll yet | false | false |
//!
//! ```
//! use tickwire::SessionTracker;
//!
//! let mut tracker = SessionTracker::new();
//! assert!(!tracker.observe(true));  // pre-market: keep polling
//! assert!(!tracker.observe(false)); // market open
//! assert!(tracker.observe(true));   // after-hours: done
//! ```

pub mod account;
pub mod error;
pub mod keys;
pub mod oauth;
pub mod quote;
pub mod session;
pub mod token;

pub use account::{Account, AccountListResponse, BalanceResponse};
pub use error::{Error, Result};
pub use keys::{Environment, KeyConfig, KeySet};
pub use oauth::OAuthParams;
pub use quote::{ExtendedHourQuoteDetail, QuoteData, QuoteResponse};
pub use session::{SessionTracker, Tick, TickStep};
pub use token::OAuthToken;
