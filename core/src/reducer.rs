//! The reducer abstraction.
//!
//! A reducer is a synchronous function `(State, Action, Environment) → State'`:
//! it validates an action against the current state and applies it in place.
//! Side effects (persistence, notifications) stay with the caller, which
//! writes the new state only when the reducer accepted the action.

/// Validates actions and applies them to state.
///
/// # Example
///
/// ```
/// use estate_core::reducer::Reducer;
///
/// struct Counter;
///
/// impl Reducer for Counter {
///     type State = u32;
///     type Action = u32;
///     type Environment = u32;
///     type Error = String;
///
///     fn reduce(&self, state: &mut u32, action: u32, max: &u32) -> Result<(), String> {
///         let next = *state + action;
///         if next > *max {
///             return Err(format!("{next} exceeds {max}"));
///         }
///         *state = next;
///         Ok(())
///     }
/// }
///
/// let mut count = 1;
/// assert!(Counter.reduce(&mut count, 2, &5).is_ok());
/// assert!(Counter.reduce(&mut count, 3, &5).is_err());
/// assert_eq!(count, 3);
/// ```
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// The environment type with injected dependencies
    type Environment;

    /// Why an action was rejected
    type Error;

    /// Apply `action` to `state`.
    ///
    /// On error `state` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] when the action is not valid for `state`.
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<(), Self::Error>;
}
