// Apollo external API client
pub mod api;
pub mod error;
pub mod types;

pub use api::{ApolloClient, RawResponse, API_KEY_HEADER};
pub use error::{ApolloError, Result};
pub use types::{CardParameter, ExternalTaskMessage, ProductCard};
