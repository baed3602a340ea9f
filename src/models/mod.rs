pub mod animal;
pub mod pasture;
pub mod sensor;
