pub mod branch_repo;
pub mod employee_repo;
pub mod report_repo;
pub mod vacation_repo;
