//! Notification - the payload broadcast to handlers

/// Marker trait for values published through the dispatcher.
///
/// The concrete type of a notification decides which handlers receive it:
/// only handlers registered for exactly that type are invoked.
///
/// # Example
///
/// ```
/// use contracts::Notification;
///
/// struct OrderPlaced {
///     order_id: u64,
/// }
///
/// impl Notification for OrderPlaced {
///     fn name(&self) -> &'static str {
///         "order_placed"
///     }
/// }
///
/// let n = OrderPlaced { order_id: 7 };
/// assert_eq!(n.name(), "order_placed");
/// assert_eq!(n.order_id, 7);
/// ```
pub trait Notification: Send + Sync + 'static {
    /// Notification name (used for logging/metrics)
    ///
    /// Defaults to the fully qualified type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
