pub mod brand;
pub mod classifier;
pub mod config;
pub mod content;
pub mod corpus;
pub mod domain;
pub mod dynamic_dns;
pub mod fusion;
pub mod redirect;
pub mod reputation;
pub mod result;
pub mod tls;
pub mod whois;

pub use brand::BrandMatcher;
pub use config::Config;
pub use corpus::ReferenceCorpus;
pub use dynamic_dns::DynamicDnsList;
pub use fusion::{AggregateResult, DecisionEngine};
pub use redirect::RedirectResolver;
pub use result::Verdict;
