/*
  Copyright 2017 Takashi Ogura

  Licensed under the Apache License, Version 2.0 (the "License");
  you may not use this file except in compliance with the License.
  You may obtain a copy of the License at

      http://www.apache.org/licenses/LICENSE-2.0

  Unless required by applicable law or agreed to in writing, software
  distributed under the License is distributed on an "AS IS" BASIS,
  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
  See the License for the specific language governing permissions and
  limitations under the License.
*/

#![warn(missing_debug_implementations, rust_2018_idioms)]

use kdtree::distance::squared_euclidean;
use num_traits::float::Float;
use num_traits::identities::Zero;
use std::fmt::Debug;
use std::mem;
use std::time::Instant;
use tracing::trace;

#[derive(Debug)]
enum ExtendStatus {
    Reached(usize),
    Advanced(usize),
    Trapped,
}

/// Node that contains user data
#[derive(Debug, Clone)]
struct Node<T> {
    parent_index: Option<usize>,
    data: T,
}

impl<T> Node<T> {
    fn new(data: T) -> Self {
        Node {
            parent_index: None,
            data,
        }
    }
}

/// RRT
#[derive(Debug)]
struct Tree<N>
where
    N: Float + Zero + Debug,
{
    kdtree: kdtree::KdTree<N, usize, Vec<N>>,
    vertices: Vec<Node<Vec<N>>>,
    name: &'static str,
}

impl<N> Tree<N>
where
    N: Float + Zero + Debug,
{
    fn new(name: &'static str, dim: usize) -> Self {
        Tree {
            kdtree: kdtree::KdTree::new(dim),
            vertices: Vec::new(),
            name,
        }
    }

    fn add_vertex(&mut self, q: &[N]) -> Result<usize, String> {
        let index = self.vertices.len();
        self.kdtree
            .add(q.to_vec(), index)
            .map_err(|e| format!("kd-tree rejected the vertex: {:?}", e))?;
        self.vertices.push(Node::new(q.to_vec()));
        Ok(index)
    }

    fn add_edge(&mut self, q1_index: usize, q2_index: usize) {
        self.vertices[q2_index].parent_index = Some(q1_index);
    }

    fn get_nearest_index(&self, q: &[N]) -> Result<usize, String> {
        let nearest = self
            .kdtree
            .nearest(q, 1, &squared_euclidean)
            .map_err(|e| format!("kd-tree query failed: {:?}", e))?;
        nearest
            .first()
            .map(|(_, index)| **index)
            .ok_or_else(|| format!("{} tree is empty", self.name))
    }

    fn extend<FF>(&mut self, q_target: &[N], extend_length: N, is_free: &mut FF) -> Result<ExtendStatus, String>
    where
        FF: FnMut(&[N]) -> bool,
    {
        let nearest_index = self.get_nearest_index(q_target)?;
        let nearest_q = &self.vertices[nearest_index].data;
        let diff_dist = squared_euclidean(q_target, nearest_q).sqrt();
        let q_new = if diff_dist < extend_length {
            q_target.to_vec()
        } else {
            nearest_q
                .iter()
                .zip(q_target)
                .map(|(near, target)| *near + (*target - *near) * extend_length / diff_dist)
                .collect::<Vec<_>>()
        };
        trace!("q_new={q_new:?}");
        if is_free(&q_new) {
            let new_index = self.add_vertex(&q_new)?;
            self.add_edge(nearest_index, new_index);
            if squared_euclidean(&q_new, q_target).sqrt() < extend_length {
                return Ok(ExtendStatus::Reached(new_index));
            }
            return Ok(ExtendStatus::Advanced(new_index));
        }
        Ok(ExtendStatus::Trapped)
    }

    fn connect<FF>(
        &mut self,
        q_target: &[N],
        extend_length: N,
        is_free: &mut FF,
        deadline: Instant,
    ) -> Result<ExtendStatus, String>
    where
        FF: FnMut(&[N]) -> bool,
    {
        loop {
            if Instant::now() > deadline {
                return Ok(ExtendStatus::Trapped);
            }
            match self.extend(q_target, extend_length, is_free)? {
                ExtendStatus::Trapped => return Ok(ExtendStatus::Trapped),
                ExtendStatus::Reached(index) => return Ok(ExtendStatus::Reached(index)),
                ExtendStatus::Advanced(_) => {}
            };
        }
    }

    fn get_until_root(&self, index: usize) -> Vec<Vec<N>> {
        let mut nodes = vec![self.vertices[index].data.clone()];
        let mut cur_index = index;
        while let Some(parent_index) = self.vertices[cur_index].parent_index {
            cur_index = parent_index;
            nodes.push(self.vertices[cur_index].data.clone())
        }
        nodes
    }
}

/// Search the path from start to goal which is free, using random_sample function.
/// Both start and goal are included into the returned path. The search gives up after
/// `num_max_try` iterations or when the `deadline` passes, whichever comes first.
pub fn dual_rrt_connect<FF, FR, N>(
    start: &[N],
    goal: &[N],
    mut is_free: FF,
    mut random_sample: FR,
    extend_length: N,
    num_max_try: usize,
    deadline: Instant,
) -> Result<Vec<Vec<N>>, String>
where
    FF: FnMut(&[N]) -> bool,
    FR: FnMut() -> Vec<N>,
    N: Float + Debug,
{
    if start.len() != goal.len() {
        return Err(format!("start has {} values, goal {}", start.len(), goal.len()));
    }
    if extend_length <= N::zero() {
        return Err("extend length must be positive".to_string());
    }
    let mut tree_a = Tree::new("start", start.len());
    let mut tree_b = Tree::new("goal", start.len());
    tree_a.add_vertex(start)?;
    tree_b.add_vertex(goal)?;
    for _ in 0..num_max_try {
        if Instant::now() > deadline {
            return Err("time budget exhausted".to_string());
        }
        let q_rand = random_sample();
        let extend_status = tree_a.extend(&q_rand, extend_length, &mut is_free)?;
        match extend_status {
            ExtendStatus::Trapped => {}
            ExtendStatus::Advanced(new_index) | ExtendStatus::Reached(new_index) => {
                let q_new = tree_a.vertices[new_index].data.clone();
                if let ExtendStatus::Reached(reach_index) =
                    tree_b.connect(&q_new, extend_length, &mut is_free, deadline)?
                {
                    let mut a_all = tree_a.get_until_root(new_index);
                    let mut b_all = tree_b.get_until_root(reach_index);
                    a_all.reverse();
                    if b_all.first() == Some(&q_new) {
                        b_all.remove(0);
                    }
                    a_all.append(&mut b_all);
                    if tree_b.name == "start" {
                        a_all.reverse();
                    }
                    return Ok(a_all);
                }
            }
        }
        mem::swap(&mut tree_a, &mut tree_b);
    }
    Err(format!("no connection after {} tries", num_max_try))
}
