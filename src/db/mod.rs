pub mod repository;
pub mod supabase;
