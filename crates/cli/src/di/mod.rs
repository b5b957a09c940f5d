pub mod dns;
pub mod early_refresh;

pub use dns::DnsServices;
pub use early_refresh::EarlyRefreshServices;
