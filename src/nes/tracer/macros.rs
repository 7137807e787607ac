// Event macros compile away unless the `tracing` feature is enabled.
// When enabled they forward to the `log` facade under per-component targets.

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            ::log::trace!(target: "nes", $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! trace_obj {
    ($obj:expr) => {
        #[cfg(feature = "tracing")]
        {
            if let Some(line) = $crate::nes::tracer::Traceable::trace($obj) {
                ::log::trace!(target: "nes", "{}", line);
            }
        }
    };
}

#[macro_export]
macro_rules! trace_ppu_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            ::log::trace!(target: "nes::ppu", "[PPU EVENT] {}", format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! trace_cpu_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            ::log::trace!(target: "nes::cpu", "[CPU EVENT] {}", format_args!($($arg)*));
        }
    };
}
