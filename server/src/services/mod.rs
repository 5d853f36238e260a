pub mod cache_evictor;
pub mod seed_loader;
