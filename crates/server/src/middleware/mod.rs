mod model_loaders;

pub use model_loaders::{
    load_category_middleware, load_reminder_middleware, load_task_middleware,
    load_user_middleware,
};
