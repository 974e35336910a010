pub mod superflat;
