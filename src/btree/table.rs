//! table walks Table type btrees. It hides the fact that a btree spans
//! several pages.

use tracing::trace;

use super::{btree_start_offset, cell, header, interior, leaf, Error, PageType, RowId};
use crate::pager::{PageNum, Pager};

enum EitherIter<'p> {
    Leaf(leaf::Iterator<'p>),
    Interior(interior::ScanIterator<'p>),
}

/// In-order traversal over the records of a Table-typed btree.
///
/// The iterator produces `(rowid, payload)` tuples in ascending rowid
/// order; the caller interprets each payload as a database row. The stack
/// holds one per-page iterator per level of the tree. The lifetime of the
/// page references in the inner iterators is that of the pager, which
/// holds the pages.
pub struct Iterator<'p> {
    root_page: PageNum,
    pager: &'p Pager,
    stack: Vec<EitherIter<'p>>,
    started: bool,
    failed: bool,
}

enum Step<'p> {
    Yield(Result<(RowId, &'p [u8]), Error>),
    Descend(PageNum),
    Pop,
    Done,
}

impl<'p> Iterator<'p> {
    /// Creates an iterator over the records of the btree rooted at
    /// `root_page`.
    pub fn new(root_page: PageNum, pager: &'p Pager) -> Iterator<'p> {
        Iterator {
            root_page,
            pager,
            stack: vec![],
            started: false,
            failed: false,
        }
    }

    /// Walks down from `pgnum` to the leftmost leaf below it, pushing a
    /// per-page iterator for every level passed.
    fn descend(&mut self, pgnum: PageNum) -> Result<(), Error> {
        let mut next_page = pgnum;
        loop {
            let page = self.pager.get_page_ro(next_page)?;
            let offset = btree_start_offset(next_page);
            let hdr = header::parse_header(page, offset)?;
            trace!(page = next_page, page_type = ?hdr.btree_page_type, "descending");
            match hdr.btree_page_type {
                PageType::TableLeaf => {
                    let ci = cell::Iterator::new(page, &hdr, offset)?;
                    self.stack.push(EitherIter::Leaf(leaf::Iterator::new(ci)));
                    return Ok(());
                }
                PageType::TableInterior => {
                    let ci = cell::Iterator::new(page, &hdr, offset)?;
                    let rmp = hdr
                        .rightmost_pointer
                        .expect("Interior pages should always have rightmost pointer.");
                    let mut it = interior::ScanIterator::new(ci, rmp);
                    // An interior page always has at least the right-most
                    // child, so the first item exists.
                    match it.next() {
                        Some(Ok(first_child)) => {
                            self.stack.push(EitherIter::Interior(it));
                            next_page = first_child;
                        }
                        Some(Err(e)) => return Err(e),
                        None => unreachable!("ScanIterator yields at least the right-most child"),
                    }
                }
                PageType::IndexInterior | PageType::IndexLeaf => {
                    return Err(Error::NotATablePage);
                }
            }
        }
    }
}

impl<'p> core::iter::Iterator for Iterator<'p> {
    type Item = Result<(RowId, &'p [u8]), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Err(e) = self.descend(self.root_page) {
                self.failed = true;
                return Some(Err(e));
            }
        }
        loop {
            let step = match self.stack.last_mut() {
                None => Step::Done,
                Some(EitherIter::Leaf(l)) => match l.next() {
                    // While a leaf has items, return them.
                    Some(item) => Step::Yield(item),
                    // A finished leaf goes back up to its parent.
                    None => Step::Pop,
                },
                Some(EitherIter::Interior(i)) => match i.next() {
                    // The next child of an interior page is explored down
                    // to its leftmost leaf.
                    Some(Ok(child)) => Step::Descend(child),
                    Some(Err(e)) => Step::Yield(Err(e)),
                    // A finished interior page goes back up to its parent.
                    None => Step::Pop,
                },
            };
            match step {
                Step::Done => return None,
                Step::Pop => {
                    self.stack.pop();
                }
                Step::Descend(child) => {
                    if let Err(e) = self.descend(child) {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
                Step::Yield(Ok(item)) => return Some(Ok(item)),
                Step::Yield(Err(e)) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Walks the btree rooted at `root_page` visiting only the pages that may
/// hold one of `row_ids`, and returns the matching `(rowid, payload)`
/// tuples in ascending rowid order.
///
/// On an interior page, a child is visited when it is the first whose
/// subtree maximum is >= a wanted rowid or the last whose subtree maximum
/// is <= it; the right-most child is visited when a wanted rowid exceeds
/// every cell's maximum. Each child is visited at most once.
pub fn lookup_rows<'p>(
    pager: &'p Pager,
    root_page: PageNum,
    row_ids: &[RowId],
) -> Result<Vec<(RowId, &'p [u8])>, Error> {
    let mut sorted: Vec<RowId> = row_ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let mut out = Vec::new();
    if !sorted.is_empty() {
        lookup_in_page(pager, root_page, &sorted, &mut out)?;
    }
    Ok(out)
}

fn lookup_in_page<'p>(
    pager: &'p Pager,
    pgnum: PageNum,
    row_ids: &[RowId],
    out: &mut Vec<(RowId, &'p [u8])>,
) -> Result<(), Error> {
    let page = pager.get_page_ro(pgnum)?;
    let offset = btree_start_offset(pgnum);
    let hdr = header::parse_header(page, offset)?;
    trace!(page = pgnum, page_type = ?hdr.btree_page_type, "pruned lookup");
    match hdr.btree_page_type {
        PageType::TableLeaf => {
            let ci = cell::Iterator::new(page, &hdr, offset)?;
            for item in leaf::Iterator::new(ci) {
                let (rowid, payload) = item?;
                if row_ids.binary_search(&rowid).is_ok() {
                    out.push((rowid, payload));
                }
            }
        }
        PageType::TableInterior => {
            let ci = cell::Iterator::new(page, &hdr, offset)?;
            let children = interior::child_refs(ci)?;
            let rightmost = hdr
                .rightmost_pointer
                .expect("Interior pages should always have rightmost pointer.");
            let mut wanted = vec![false; children.len()];
            let mut want_rightmost = false;
            for &r in row_ids {
                match children.iter().position(|c| c.max_row_id >= r) {
                    Some(i) => wanted[i] = true,
                    None => want_rightmost = true,
                }
                if let Some(i) = children.iter().rposition(|c| c.max_row_id <= r) {
                    wanted[i] = true;
                }
            }
            for (child, wanted) in children.iter().zip(wanted) {
                if wanted {
                    lookup_in_page(pager, child.page, row_ids, out)?;
                }
            }
            if want_rightmost {
                lookup_in_page(pager, rightmost, row_ids, out)?;
            }
        }
        PageType::IndexInterior | PageType::IndexLeaf => {
            return Err(Error::NotATablePage);
        }
    }
    Ok(())
}
