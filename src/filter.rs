use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::Drawable;
use crate::buffer::PixelBuffer;
use crate::error::{UbeError, UbeResult};

/// Positional, filter-specific argument list.
///
/// The shape is opaque to the queue and registry; each filter validates its
/// own arguments and defaults missing optional entries to neutral values.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilterArgs(Vec<serde_json::Value>);

impl FilterArgs {
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        Self(values)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric argument at `idx`, or `None` when absent or JSON null.
    pub fn f64_opt(&self, idx: usize) -> UbeResult<Option<f64>> {
        match self.0.get(idx) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| {
                UbeError::invalid_argument(format!("argument {idx} must be a number, got {v}"))
            }),
        }
    }

    /// Numeric argument at `idx`, defaulting when absent.
    pub fn f64_or(&self, idx: usize, default: f64) -> UbeResult<f64> {
        Ok(self.f64_opt(idx)?.unwrap_or(default))
    }

    /// Required numeric argument at `idx`.
    pub fn f64_req(&self, idx: usize) -> UbeResult<f64> {
        self.f64_opt(idx)?
            .ok_or_else(|| UbeError::invalid_argument(format!("missing argument {idx}")))
    }

    /// Required integer argument at `idx`.
    pub fn i64_req(&self, idx: usize) -> UbeResult<i64> {
        let v = self.f64_req(idx)?;
        if v.fract() != 0.0 {
            return Err(UbeError::invalid_argument(format!(
                "argument {idx} must be an integer, got {v}"
            )));
        }
        Ok(v as i64)
    }

    /// Required string argument at `idx`.
    pub fn str_req(&self, idx: usize) -> UbeResult<&str> {
        match self.0.get(idx) {
            Some(serde_json::Value::String(s)) => Ok(s),
            Some(v) => Err(UbeError::invalid_argument(format!(
                "argument {idx} must be a string, got {v}"
            ))),
            None => Err(UbeError::invalid_argument(format!("missing argument {idx}"))),
        }
    }
}

impl From<Vec<serde_json::Value>> for FilterArgs {
    fn from(values: Vec<serde_json::Value>) -> Self {
        Self(values)
    }
}

/// One queued filter invocation: registry name plus its argument list.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilterSpec {
    pub name: String,
    pub args: FilterArgs,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>, args: FilterArgs) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Ordered list of pending filters. Insertion order is application order;
/// clearing after a flush is an explicit state transition, done by the
/// surface that owns the queue.
#[derive(Clone, Debug, Default)]
pub struct FilterQueue {
    specs: Vec<FilterSpec>,
}

impl FilterQueue {
    pub fn push(&mut self, spec: FilterSpec) {
        self.specs.push(spec);
    }

    pub fn specs(&self) -> &[FilterSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn clear(&mut self) {
        self.specs.clear();
    }

    /// Move the pending specs out, leaving the queue empty.
    pub fn take(&mut self) -> Vec<FilterSpec> {
        std::mem::take(&mut self.specs)
    }
}

/// Surface access handed to filters that need side effects beyond the working
/// buffer. Only crop uses it today.
pub struct FilterCtx<'a> {
    drawable: &'a mut dyn Drawable,
    surface_ops: bool,
}

impl<'a> FilterCtx<'a> {
    /// Context for a whole-surface flush; surface mutation is allowed.
    pub fn new(drawable: &'a mut dyn Drawable) -> Self {
        Self {
            drawable,
            surface_ops: true,
        }
    }

    /// Context for rect- and mask-limited flushes. The write-back offset is
    /// only meaningful at the original dimensions, so `write_back` and
    /// `resize_surface` are refused before any pixel is touched.
    pub fn pinned(drawable: &'a mut dyn Drawable) -> Self {
        Self {
            drawable,
            surface_ops: false,
        }
    }

    pub fn surface_width(&self) -> u32 {
        self.drawable.width()
    }

    pub fn surface_height(&self) -> u32 {
        self.drawable.height()
    }

    fn check_surface_ops(&self) -> UbeResult<()> {
        if self.surface_ops {
            return Ok(());
        }
        Err(UbeError::invalid_argument(
            "filter cannot mutate the surface during a region-limited apply",
        ))
    }

    pub fn write_back(&mut self, buf: &PixelBuffer) -> UbeResult<()> {
        self.check_surface_ops()?;
        self.drawable.write_pixels(buf, 0, 0)
    }

    pub fn read_rect(&self, x: u32, y: u32, w: u32, h: u32) -> UbeResult<PixelBuffer> {
        self.drawable.read_pixels(x, y, w, h)
    }

    pub fn resize_surface(&mut self, w: u32, h: u32) -> UbeResult<()> {
        self.check_surface_ops()?;
        self.drawable.resize(w, h)
    }
}

/// A pure pixel transform.
///
/// Returning `Some(buffer)` replaces the working buffer for the rest of the
/// run (filters that change dimensions, e.g. crop); returning `None` means
/// the in-place mutation of `buf` is the result.
pub trait Filter: Send + Sync {
    fn apply(
        &self,
        buf: &mut PixelBuffer,
        args: &FilterArgs,
        ctx: &mut FilterCtx<'_>,
    ) -> UbeResult<Option<PixelBuffer>>;
}

impl<F> Filter for F
where
    F: Fn(&mut PixelBuffer, &FilterArgs, &mut FilterCtx<'_>) -> UbeResult<Option<PixelBuffer>>
        + Send
        + Sync,
{
    fn apply(
        &self,
        buf: &mut PixelBuffer,
        args: &FilterArgs,
        ctx: &mut FilterCtx<'_>,
    ) -> UbeResult<Option<PixelBuffer>> {
        self(buf, args, ctx)
    }
}

/// Name-to-transform dispatch table, extensible at startup.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, filter: Arc<dyn Filter>) {
        self.filters.insert(name.into(), filter);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.get(name)
    }

    /// Run every spec in order over `buf`, threading each filter's output
    /// into the next. Unknown names are skipped; callers may queue filters
    /// from a registry populated later, so a miss is policy, not an error.
    pub fn run(
        &self,
        mut buf: PixelBuffer,
        specs: &[FilterSpec],
        ctx: &mut FilterCtx<'_>,
    ) -> UbeResult<PixelBuffer> {
        for spec in specs {
            let Some(filter) = self.filters.get(&spec.name) else {
                tracing::debug!(filter = %spec.name, "unknown filter, skipping");
                continue;
            };
            if let Some(replacement) = filter.apply(&mut buf, &spec.args, ctx)? {
                buf = replacement;
            }
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FilterRegistry").field("filters", &names).finish()
    }
}
