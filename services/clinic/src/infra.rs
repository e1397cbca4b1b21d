pub mod db;
pub mod password;
pub mod spreadsheet;
