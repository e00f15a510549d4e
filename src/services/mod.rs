// The asset service is the sole asset write path; reference-data writes
// go through their own service so every mutation emits the events the
// cache layer subscribes to.
pub mod assets;
pub mod imports;
pub mod reference_data;
pub mod summary;
