pub mod postgres;
pub mod profiles;

pub use postgres::create_pool;
pub use profiles::PgProfileStore;
