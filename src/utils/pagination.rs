//! 列表视图（首页动态、搜索、推荐）的分页窗口
//!
//! 页码从 1 开始。窗口不会越过列表末尾，
//! 请求超出范围的页得到空切片而不是错误。

use std::ops::Range;

/// 单个列表的切片边界与相邻页码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: usize,
    pub end: usize,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl PageWindow {
    /// 长度为 `len` 的单个列表的窗口
    pub fn single(page: u64, per_page: u64, len: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let end = bounded(page.saturating_mul(per_page), len);
        let start = bounded((page - 1).saturating_mul(per_page), len).min(end);

        Self {
            start,
            end,
            prev_page: (page > 1).then(|| page - 1),
            next_page: ((page.saturating_mul(per_page) as u128) < len as u128).then(|| page + 1),
        }
    }

    /// 两个列表同步分页（搜索页并排显示用户与内容）
    ///
    /// 分页持续到较长的列表结束，较短的列表在后面的页中为空。
    pub fn dual(page: u64, per_page: u64, len_a: usize, len_b: usize) -> (Range<usize>, Range<usize>, Self) {
        let a = Self::single(page, per_page, len_a);
        let b = Self::single(page, per_page, len_b);
        let combined = Self {
            start: 0,
            end: 0,
            prev_page: a.prev_page,
            next_page: a.next_page.or(b.next_page),
        };
        (a.range(), b.range(), combined)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

fn bounded(index: u64, len: usize) -> usize {
    usize::try_from(index).map_or(len, |i| i.min(len))
}

/// 一页数据及翻页信息
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl<T> Paged<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            prev_page: self.prev_page,
            next_page: self.next_page,
        }
    }
}

pub fn paginate<T>(mut items: Vec<T>, page: u64, per_page: u64) -> Paged<T> {
    let window = PageWindow::single(page, per_page, items.len());
    items.truncate(window.end);
    let items = items.split_off(window.start);
    Paged {
        items,
        page: page.max(1),
        prev_page: window.prev_page,
        next_page: window.next_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_has_no_prev() {
        let w = PageWindow::single(1, 16, 40);
        assert_eq!(w.range(), 0..16);
        assert_eq!(w.prev_page, None);
        assert_eq!(w.next_page, Some(2));
    }

    #[test]
    fn test_last_partial_page() {
        let w = PageWindow::single(3, 16, 40);
        assert_eq!(w.range(), 32..40);
        assert_eq!(w.prev_page, Some(2));
        assert_eq!(w.next_page, None);
    }

    #[test]
    fn test_exact_multiple_has_no_next() {
        let w = PageWindow::single(2, 16, 32);
        assert_eq!(w.range(), 16..32);
        assert_eq!(w.next_page, None);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let w = PageWindow::single(9, 16, 20);
        assert_eq!(w.range(), 20..20);
        assert_eq!(w.prev_page, Some(8));
        assert_eq!(w.next_page, None);
    }

    #[test]
    fn test_page_zero_is_first_page() {
        assert_eq!(PageWindow::single(0, 16, 5), PageWindow::single(1, 16, 5));
    }

    #[test]
    fn test_empty_list() {
        let w = PageWindow::single(1, 16, 0);
        assert_eq!(w.range(), 0..0);
        assert_eq!(w.prev_page, None);
        assert_eq!(w.next_page, None);
    }

    #[test]
    fn test_dual_continues_until_longer_list_ends() {
        let (users, content, nav) = PageWindow::dual(2, 10, 5, 25);
        assert_eq!(users, 5..5);
        assert_eq!(content, 10..20);
        assert_eq!(nav.prev_page, Some(1));
        assert_eq!(nav.next_page, Some(3));

        let (_, content, nav) = PageWindow::dual(3, 10, 5, 25);
        assert_eq!(content, 20..25);
        assert_eq!(nav.next_page, None);
    }

    #[test]
    fn test_paginate_slices_items() {
        let items: Vec<u32> = (0..20).collect();
        let page = paginate(items, 2, 8);
        assert_eq!(page.items, (8..16).collect::<Vec<_>>());
        assert_eq!(page.prev_page, Some(1));
        assert_eq!(page.next_page, Some(3));

        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items[0], 16);
        assert_eq!(doubled.page, 2);
    }
}
