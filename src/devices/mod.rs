pub mod fender;
