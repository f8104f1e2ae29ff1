pub mod compensator;
pub mod frequency_response;
pub mod plant;
pub mod polynomial;
pub mod root_locus;
pub mod time_response;
pub mod transfer_function;
