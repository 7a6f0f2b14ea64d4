use fusionboard_application::{AuthorizationService, ProjectService, TaskService, UserService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub user_service: UserService,
    pub project_service: ProjectService,
    pub task_service: TaskService,
    pub frontend_url: String,
}
