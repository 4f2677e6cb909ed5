//! Macros for declaring state and event identifiers.

/// Declare named [`StateId`](crate::core::StateId) constants.
///
/// The constant name doubles as the display name.
///
/// # Example
///
/// ```
/// use statelog::state_ids;
///
/// state_ids! {
///     pub IDLE = 1,
///     RUNNING = 2,
/// }
///
/// assert_eq!(IDLE.value(), 1);
/// assert_eq!(RUNNING.name(), "RUNNING");
/// ```
#[macro_export]
macro_rules! state_ids {
    ($($vis:vis $name:ident = $value:expr),* $(,)?) => {
        $(
            $vis const $name: $crate::core::StateId =
                $crate::core::StateId::named($value, stringify!($name));
        )*
    };
}

/// Declare named [`Event`](crate::core::Event) constants.
///
/// Values should be single bits so events can be combined in an
/// [`EventSet`](crate::core::EventSet).
///
/// # Example
///
/// ```
/// use statelog::events;
///
/// events! {
///     pub START = 0x1,
///     STOP = 0x2,
/// }
///
/// assert!(START.is_single_bit());
/// assert_eq!(STOP.name(), "STOP");
/// ```
#[macro_export]
macro_rules! events {
    ($($vis:vis $name:ident = $value:expr),* $(,)?) => {
        $(
            $vis const $name: $crate::core::Event =
                $crate::core::Event::named($value, stringify!($name));
        )*
    };
}

#[cfg(test)]
mod tests {
    use crate::core::EventSet;

    state_ids! {
        OPEN = 3,
        CLOSED = 4,
    }

    events! {
        PUSH = 0x1,
        PULL = 0x2,
    }

    #[test]
    fn state_ids_macro_names_constants() {
        assert_eq!(OPEN.value(), 3);
        assert_eq!(OPEN.name(), "OPEN");
        assert_ne!(OPEN, CLOSED);
    }

    #[test]
    fn events_macro_builds_combinable_events() {
        let both = PUSH | PULL;
        assert_eq!(both, EventSet::from_bits(0x3));
        assert_eq!(PULL.name(), "PULL");
    }

    #[test]
    fn macros_accept_visibility() {
        mod inner {
            state_ids! {
                pub SHARED = 7,
            }
        }

        assert_eq!(inner::SHARED.value(), 7);
    }
}
