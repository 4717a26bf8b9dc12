//! Keyed value animation
//!
//! A [`TweenScheduler<T>`] drives any number of independent tweens. Callbacks
//! receive `&mut T`, the state the tweens animate, which the owner passes to
//! [`TweenScheduler::tick`]. Registering under an existing key replaces that
//! tween in place.

use super::easing::Easing;
use crate::{lerp, sanitize};

type UpdateFn<T> = Box<dyn FnMut(&mut T, f32)>;
type CompleteFn<T> = Box<dyn FnOnce(&mut T)>;

/// One running animation
pub struct Tween<T> {
    from: f32,
    to: f32,
    duration_ms: f32,
    easing: Easing,
    elapsed_ms: f32,
    value: f32,
    on_update: Option<UpdateFn<T>>,
    on_complete: Option<CompleteFn<T>>,
}

impl<T> Tween<T> {
    /// Called every tick with the interpolated value
    pub fn on_update(&mut self, f: impl FnMut(&mut T, f32) + 'static) -> &mut Self {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Called once, after the final update, just before removal
    pub fn on_complete(&mut self, f: impl FnOnce(&mut T) + 'static) -> &mut Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Linear time progress in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }
}

impl<T> std::fmt::Debug for Tween<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration_ms", &self.duration_ms)
            .field("easing", &self.easing)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("value", &self.value)
            .finish()
    }
}

/// Registry of tweens keyed by name, iterated in registration order
#[derive(Debug)]
pub struct TweenScheduler<T> {
    tweens: Vec<(String, Tween<T>)>,
}

impl<T> Default for TweenScheduler<T> {
    fn default() -> Self {
        Self { tweens: Vec::new() }
    }
}

impl<T> TweenScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) the tween under `key`.
    ///
    /// A non-positive or NaN duration completes on the next tick.
    pub fn animate(
        &mut self,
        key: impl Into<String>,
        from: f32,
        to: f32,
        duration_ms: f32,
        easing: Easing,
    ) -> &mut Tween<T> {
        let key = key.into();
        let tween = Tween {
            from,
            to,
            duration_ms: sanitize(duration_ms),
            easing,
            elapsed_ms: 0.0,
            value: from,
            on_update: None,
            on_complete: None,
        };

        let index = match self.tweens.iter().position(|(k, _)| *k == key) {
            Some(index) => {
                self.tweens[index].1 = tween;
                index
            }
            None => {
                self.tweens.push((key, tween));
                self.tweens.len() - 1
            }
        };
        &mut self.tweens[index].1
    }

    /// Advance every tween by `dt_ms`, finishing those that reach the end
    pub fn tick(&mut self, ctx: &mut T, dt_ms: f32) {
        let dt_ms = sanitize(dt_ms);
        let mut i = 0;
        while i < self.tweens.len() {
            let tween = &mut self.tweens[i].1;
            tween.elapsed_ms += dt_ms;
            let progress = tween.progress();
            tween.value = lerp(tween.from, tween.to, tween.easing.apply(progress));
            if progress >= 1.0 {
                tween.value = tween.to;
            }
            let value = tween.value;
            if let Some(update) = tween.on_update.as_mut() {
                update(ctx, value);
            }

            if progress >= 1.0 {
                let (_, mut done) = self.tweens.remove(i);
                if let Some(complete) = done.on_complete.take() {
                    complete(ctx);
                }
            } else {
                i += 1;
            }
        }
    }

    /// Current value of the tween under `key`
    pub fn value(&self, key: &str) -> Option<f32> {
        self.get(key).map(Tween::value)
    }

    pub fn get(&self, key: &str) -> Option<&Tween<T>> {
        self.tweens.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drop a tween without running its completion callback
    pub fn cancel(&mut self, key: &str) -> bool {
        let before = self.tweens.len();
        self.tweens.retain(|(k, _)| k != key);
        self.tweens.len() != before
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }
}
