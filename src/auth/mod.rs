pub mod identity;

pub use identity::{
    extract_user_id_from_headers, AdminAccess, CurrentUser, ADMIN_TOKEN_HEADER, USER_ID_HEADER,
};
