mod helpers;
mod import_test;
mod patient_test;
mod reservation_test;
mod router_test;
