/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// A free list of objects that are expensive or wasteful to create per use.
///
/// Objects are handed out by [`ReusePool::acquire`] and go back to the list
/// when the returned guard is dropped.
pub struct ReusePool<T> {
    free: Mutex<Vec<T>>,
    create: Box<dyn Fn() -> T + Send + Sync>,
    reset: Box<dyn Fn(&mut T) + Send + Sync>,
}

impl<T> ReusePool<T> {
    pub fn new<C, R>(create: C, reset: R) -> Self
    where
        C: Fn() -> T + Send + Sync + 'static,
        R: Fn(&mut T) + Send + Sync + 'static,
    {
        ReusePool {
            free: Mutex::new(Vec::new()),
            create: Box::new(create),
            reset: Box::new(reset),
        }
    }

    pub fn acquire(&self) -> PooledItem<'_, T> {
        let item = self
            .free
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();
        let item = match item {
            Some(mut v) => {
                (self.reset)(&mut v);
                v
            }
            None => (self.create)(),
        };
        PooledItem {
            pool: self,
            item: Some(item),
        }
    }

    fn release(&self, item: T) {
        self.free
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(item);
    }

    #[cfg(test)]
    fn idle_count(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}

pub struct PooledItem<'a, T> {
    pool: &'a ReusePool<T>,
    item: Option<T>,
}

impl<T> Deref for PooledItem<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // only taken out in drop
        match &self.item {
            Some(v) => v,
            None => unreachable!(),
        }
    }
}

impl<T> DerefMut for PooledItem<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.item {
            Some(v) => v,
            None => unreachable!(),
        }
    }
}

impl<T> Drop for PooledItem<'_, T> {
    fn drop(&mut self) {
        if let Some(v) = self.item.take() {
            self.pool.release(v);
        }
    }
}
