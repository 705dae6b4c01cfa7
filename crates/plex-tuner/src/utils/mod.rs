pub mod b36;
pub mod http_client;
pub mod safe_url;
