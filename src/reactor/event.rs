use bitflags::bitflags;

bitflags! {
    /// Readiness event mask.
    ///
    /// An `Events` value describes either the event kinds a watcher has
    /// requested (its interest) or the event kinds the multiplexer observed
    /// on a descriptor during one cycle.
    ///
    /// An active watcher must carry a non-empty interest mask; an empty
    /// mask on a registered watcher is registry corruption.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Events: u8 {
        /// The descriptor has data available for reading.
        const READABLE = 1 << 0;

        /// The descriptor can accept a write without blocking.
        const WRITABLE = 1 << 1;

        /// An error condition is pending on the descriptor.
        const ERROR = 1 << 2;

        /// The peer closed its end of the connection.
        const HANGUP = 1 << 3;
    }
}
