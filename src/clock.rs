//! 时间来源。浏览器中使用 `Date.now()`，原生环境使用系统时间。

/// 自 Unix 纪元以来的毫秒数。
pub type Timestamp = u64;

pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> Timestamp {
        web_sys::js_sys::Date::now() as Timestamp
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as Timestamp)
            .unwrap_or_default()
    }
}

/// 固定时间，测试用；可以通过 `advance` 推进。
#[derive(Debug, Default)]
pub struct FixedClock {
    now: std::cell::Cell<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: std::cell::Cell::new(now),
        }
    }

    pub fn advance(&self, millis: Timestamp) {
        self.now.set(self.now.get() + millis);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> Timestamp {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now_ms(&self) -> Timestamp {
        (**self).now_ms()
    }
}
