pub mod mustang;
