// crates/afv_physics/src/numerics/atomic.rs

//! f64 原子累加
//!
//! 残差装配按面并行，同一单元可能被多条面同时更新，
//! 通过 `AtomicU64` 位转换 + CAS 循环串行化。最终值是所有贡献
//! 之和，与调度无关（浮点加法顺序引起的舍入差异除外）。

use std::sync::atomic::{AtomicU64, Ordering};

/// 支持原子加法的 f64 切片
pub struct AtomicF64Slice {
    data: Vec<AtomicU64>,
}

impl AtomicF64Slice {
    /// 创建全零切片
    pub fn zeroed(n: usize) -> Self {
        Self {
            data: (0..n).map(|_| AtomicU64::new(0.0_f64.to_bits())).collect(),
        }
    }

    /// 长度
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 原子加法
    #[inline]
    pub fn add(&self, i: usize, value: f64) {
        let cell = &self.data[i];
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match cell.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// 读取单个值
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        f64::from_bits(self.data[i].load(Ordering::Relaxed))
    }

    /// 导出为普通向量
    pub fn into_vec(self) -> Vec<f64> {
        self.data
            .into_iter()
            .map(|a| f64::from_bits(a.into_inner()))
            .collect()
    }
}
