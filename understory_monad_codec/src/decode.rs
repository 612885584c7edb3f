// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Point;
use tracing::{debug, instrument};
use understory_monad::placement::spiral_offset;
use understory_monad::{NodeId, Tree, TreeError};

use crate::error::{DecodeError, MalformedText};
use crate::index::parse_index;

/// Knobs for [`decode`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DecodeOptions {
    /// Position of the decoded root. Defaults to the target's next spiral slot.
    pub position_hint: Option<Point>,
    /// Remove whatever was created before returning an error.
    pub rollback_on_error: bool,
}

/// Decode `text` into a new child of `target` and return that child.
///
/// Surrounding whitespace is ignored. On error, the nodes created so far stay in the
/// tree (and are named by [`DecodeError::partial`]) unless
/// [`DecodeOptions::rollback_on_error`] is set.
#[instrument(level = "trace", skip(tree, text))]
pub fn decode(
    tree: &mut Tree,
    text: &str,
    target: NodeId,
    options: &DecodeOptions,
) -> Result<NodeId, DecodeError> {
    let body = text.trim();
    let base = text.len() - text.trim_start().len();
    let origin = tree.position(target).ok_or(DecodeError {
        kind: MalformedText::DeadTarget(target),
        offset: base,
        partial: None,
    })?;
    let position = options
        .position_hint
        .unwrap_or_else(|| origin + spiral_offset(tree.child_count(target)));

    let mut cursor = Cursor::new(body, base);
    let mut created = Vec::new();
    let result = cursor
        .structure(tree, target, position, &mut created)
        .and_then(|root| {
            if cursor.peek().is_some() {
                return Err(cursor.fail(MalformedText::TrailingInput));
            }
            let mut nodes = created.iter().copied();
            Cursor::new(body, base).links(tree, &mut nodes)?;
            Ok(root)
        });

    match result {
        Ok(root) => {
            debug!(?root, nodes = created.len(), "decoded subtree");
            Ok(root)
        }
        Err((kind, offset)) => {
            let mut partial = created.first().copied();
            if let Some(root) = partial.filter(|_| options.rollback_on_error) {
                tree.remove_node(root, target);
                partial = None;
            }
            debug!(%kind, offset, ?partial, "decode failed");
            Err(DecodeError {
                kind,
                offset,
                partial,
            })
        }
    }
}

type Step<T> = Result<T, (MalformedText, usize)>;

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    /// Offset of `text` inside the caller's string.
    base: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, base: usize) -> Self {
        Self { text, pos: 0, base }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn fail(&self, kind: MalformedText) -> (MalformedText, usize) {
        (kind, self.base + self.pos)
    }

    fn expect(&mut self, expected: char) -> Step<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(self.fail(MalformedText::Unexpected { expected, found })),
            None => Err(self.fail(MalformedText::UnexpectedEnd)),
        }
    }

    fn name(&mut self) -> Step<&'a str> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(':') => return Ok(&self.text[start..self.pos]),
                Some(found @ ('[' | ']' | ';')) => {
                    return Err(self.fail(MalformedText::Unexpected {
                        expected: ':',
                        found,
                    }));
                }
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.fail(MalformedText::UnexpectedEnd)),
            }
        }
    }

    fn index(&mut self) -> Step<usize> {
        let (value, used) = parse_index(&self.text[self.pos..]).map_err(|kind| self.fail(kind))?;
        self.pos += used;
        Ok(value)
    }

    /// Create the nodes of one block and its descendants, skipping link sections.
    ///
    /// Nesting is tracked on an explicit stack of open blocks, so depth is only
    /// bounded by memory.
    fn structure(
        &mut self,
        tree: &mut Tree,
        parent: NodeId,
        position: Point,
        created: &mut Vec<NodeId>,
    ) -> Step<NodeId> {
        let root = self.open_block(tree, parent, position, created)?;
        let mut open = vec![(root, position)];
        while let Some(&(node, at)) = open.last() {
            if self.peek() == Some('[') {
                let child_at = at + spiral_offset(tree.child_count(node));
                let child = self.open_block(tree, node, child_at, created)?;
                open.push((child, child_at));
                continue;
            }
            self.expect(':')?;
            self.skip_links()?;
            self.expect(']')?;
            open.pop();
        }
        Ok(root)
    }

    /// `[name:` of one block: create the node and name it.
    fn open_block(
        &mut self,
        tree: &mut Tree,
        parent: NodeId,
        position: Point,
        created: &mut Vec<NodeId>,
    ) -> Step<NodeId> {
        self.expect('[')?;
        let name = self.name()?;
        let node = tree
            .add_node_at(parent, position)
            .map_err(|_| self.fail(MalformedText::DeadTarget(parent)))?;
        created.push(node);
        tree.rename(node, name)
            .map_err(|_| self.fail(MalformedText::DeadTarget(node)))?;
        self.expect(':')?;
        Ok(node)
    }

    /// Advance to the `]` closing a link section.
    fn skip_links(&mut self) -> Step<()> {
        loop {
            match self.peek() {
                Some(']') => break,
                Some('[') => {
                    return Err(self.fail(MalformedText::Unexpected {
                        expected: ']',
                        found: '[',
                    }));
                }
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.fail(MalformedText::UnexpectedEnd)),
            }
        }
        Ok(())
    }

    /// Walk the same text again, resolving link descriptors against the nodes
    /// created by [`Self::structure`], in the same pre-order.
    ///
    /// `ancestors` holds the open blocks, innermost last; jumps index into it.
    fn links(&mut self, tree: &mut Tree, nodes: &mut impl Iterator<Item = NodeId>) -> Step<()> {
        let mut ancestors = Vec::new();
        self.enter_block(nodes, &mut ancestors)?;
        while let Some(&node) = ancestors.last() {
            if self.peek() == Some('[') {
                self.enter_block(nodes, &mut ancestors)?;
                continue;
            }
            self.expect(':')?;
            while self.peek() != Some(']') {
                self.descriptor(tree, node, &ancestors)?;
            }
            self.expect(']')?;
            ancestors.pop();
        }
        Ok(())
    }

    fn enter_block(
        &mut self,
        nodes: &mut impl Iterator<Item = NodeId>,
        ancestors: &mut Vec<NodeId>,
    ) -> Step<()> {
        self.expect('[')?;
        let node = nodes
            .next()
            .ok_or_else(|| self.fail(MalformedText::UnexpectedEnd))?;
        self.name()?;
        self.expect(':')?;
        ancestors.push(node);
        Ok(())
    }

    fn descriptor(&mut self, tree: &mut Tree, owner: NodeId, ancestors: &[NodeId]) -> Step<()> {
        let origin = self.base + self.pos;
        let at = |kind| (kind, origin);

        let local_index = self.index()?;
        self.expect('>')?;
        let jump = self.index()?;
        let mut turns = Vec::new();
        while !matches!(self.peek(), Some('?' | ';') | None) {
            turns.push(self.index()?);
        }
        let reversed = self.peek() == Some('?');
        if reversed {
            self.bump();
        }
        self.expect(';')?;

        let local = tree
            .nth_child(owner, local_index)
            .ok_or(at(MalformedText::IndexOutOfRange { index: local_index }))?;
        let mut far = jump
            .checked_add(1)
            .and_then(|up| ancestors.len().checked_sub(up))
            .map(|i| ancestors[i])
            .ok_or(at(MalformedText::JumpOutOfRange { jump }))?;
        for index in turns {
            far = tree
                .nth_child(far, index)
                .ok_or(at(MalformedText::IndexOutOfRange { index }))?;
        }
        let (start, end) = if reversed { (far, local) } else { (local, far) };
        match tree.add_link(owner, start, end) {
            Ok(_) => Ok(()),
            Err(TreeError::DuplicateLink { existing, .. }) => {
                debug!(?existing, "skipping duplicate link descriptor");
                Ok(())
            }
            Err(e) => Err(at(MalformedText::Link(e))),
        }
    }
}
