pub mod create_branch_mr {
    pub mod create_branch_mr_request;
    pub mod create_branch_mr_response;
    pub mod create_branch_mr_route;
}
pub mod ping_route;
