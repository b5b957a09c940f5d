pub mod cache;
pub mod resolver;
pub mod server;
pub mod typify;
pub mod upstream;
pub mod wire;

pub use cache::{CacheKey, CacheMetrics, CachePolicy, ItemStore, LateTier};
pub use resolver::{CachedResolver, CachedResolverBuilder};
pub use server::DnsServerHandler;
pub use typify::StandardResponseClassifier;
pub use upstream::UdpUpstreamResolver;
pub use wire::{decode_message, encode_message};
