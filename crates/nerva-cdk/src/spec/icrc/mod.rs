pub mod icrc1;
