pub mod currency;
pub mod debt;
pub mod dscr;
pub mod record;
