pub mod buckets;
pub mod timeline;
