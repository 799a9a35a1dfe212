//! Callable objects; construction and calls live in `dispatch`

use crate::object::TypeTag;

typed_view! {
    /// Handle to any object with a call slot
    Callable => TypeTag::Callable
}
