// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Macros for wiring component ports together.

pub use paste::paste;

/// Connect an [OutPort](spur_engine::port::OutPort) of one component to an
/// [InPort](spur_engine::port::InPort) of another, by port name.
///
/// Indexed ports take an extra index expression on either side. The macro
/// evaluates to a [SimResult](spur_engine::types::SimResult) so connection
/// failures can be propagated with `?`.
#[macro_export]
macro_rules! connect_port {
    ($from:expr, $from_port:ident => $to:expr, $to_port:ident) => {{
        spur_track::debug!($from.entity ; "Connect {}.{} -> {}.{}",
            $from, stringify!($from_port), $to, stringify!($to_port));
        $crate::connect::paste! {
            $from.[< connect_port_ $from_port >]($to.[< port_ $to_port >]())
        }
    }};
    ($from:expr, $from_port:ident, $from_index:expr => $to:expr, $to_port:ident) => {{
        let from_index: usize = $from_index;
        spur_track::debug!($from.entity ; "Connect {}.{}[{}] -> {}.{}",
            $from, stringify!($from_port), from_index, $to, stringify!($to_port));
        $crate::connect::paste! {
            $from.[< connect_port_ $from_port _i >](from_index, $to.[< port_ $to_port >]())
        }
    }};
    ($from:expr, $from_port:ident => $to:expr, $to_port:ident, $to_index:expr) => {{
        let to_index: usize = $to_index;
        spur_track::debug!($from.entity ; "Connect {}.{} -> {}.{}[{}]",
            $from, stringify!($from_port), $to, stringify!($to_port), to_index);
        $crate::connect::paste! {
            $from.[< connect_port_ $from_port >]($to.[< port_ $to_port _i >](to_index))
        }
    }};
    ($from:expr, $from_port:ident, $from_index:expr => $to:expr, $to_port:ident, $to_index:expr) => {{
        let from_index: usize = $from_index;
        let to_index: usize = $to_index;
        spur_track::debug!($from.entity ; "Connect {}.{}[{}] -> {}.{}[{}]",
            $from, stringify!($from_port), from_index, $to, stringify!($to_port), to_index);
        $crate::connect::paste! {
            $from.[< connect_port_ $from_port _i >](from_index, $to.[< port_ $to_port _i >](to_index))
        }
    }};
}

/// Forward a connect call to a tx port held in a `RefCell<Option<_>>`.
#[macro_export]
macro_rules! connect_tx {
    ($port:expr, $fn:ident ; $channel:ident) => {
        $port.borrow_mut().as_mut().unwrap().$fn($channel)
    };
}

/// Call an accessor on an rx port held in a `RefCell<Option<_>>`.
#[macro_export]
macro_rules! port_rx {
    ($port:expr, $fn:ident) => {
        $port.borrow().as_ref().unwrap().$fn()
    };
}

/// Take a value out of a `RefCell<Option<_>>`.
#[macro_export]
macro_rules! take_option {
    ($var:expr) => {
        $var.borrow_mut().take().unwrap()
    };
}
