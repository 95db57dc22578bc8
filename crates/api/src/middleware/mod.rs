pub mod request_stats;
