pub mod discriminators;
