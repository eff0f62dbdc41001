use std::collections::BTreeMap;

use crate::analysis::vectorizer::{SparseVector, TfidfVectorizer, VectorizerOptions};

/// Disjoint-set forest with path compression and union by rank.
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.rank[ra] < self.rank[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        if self.rank[ra] == self.rank[rb] {
            self.rank[ra] += 1;
        }
    }

    /// Equivalence classes ordered by their smallest member; members ascending.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut order: Vec<usize> = Vec::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            let members = by_root.entry(root).or_default();
            if members.is_empty() {
                order.push(root);
            }
            members.push(i);
        }
        order
            .into_iter()
            .filter_map(|root| by_root.remove(&root))
            .collect()
    }
}

/// Partition vector indices by merging every pair whose cosine similarity reaches `threshold`.
///
/// Quadratic in the number of vectors; batches are expected to stay in the low hundreds.
pub fn cluster(vectors: &[SparseVector], threshold: f64) -> Vec<Vec<usize>> {
    let n = vectors.len();
    let mut uf = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if vectors[i].cosine(&vectors[j]) >= threshold {
                uf.union(i, j);
            }
        }
    }
    uf.groups()
}

pub fn singletons(n: usize) -> Vec<Vec<usize>> {
    (0..n).map(|i| vec![i]).collect()
}

/// Clusters plus the fitted vocabulary they were computed in, when fitting succeeded.
pub struct TextClusters {
    pub partition: Vec<Vec<usize>>,
    pub vectorizer: Option<TfidfVectorizer>,
    pub vectors: Vec<SparseVector>,
}

/// Fit the clustering vocabulary over `texts` and cluster them.
///
/// Degenerate input (empty vocabulary) yields one singleton per text and no vectorizer.
pub fn cluster_texts<S: AsRef<str>>(texts: &[S], threshold: f64) -> TextClusters {
    if texts.len() <= 1 {
        return TextClusters {
            partition: singletons(texts.len()),
            vectorizer: None,
            vectors: Vec::new(),
        };
    }

    let mut vectorizer = TfidfVectorizer::new(VectorizerOptions::clustering());
    match vectorizer.fit_transform(texts) {
        Ok(vectors) => TextClusters {
            partition: cluster(&vectors, threshold),
            vectorizer: Some(vectorizer),
            vectors,
        },
        Err(e) => {
            tracing::info!("Clustering {} texts as singletons: {}", texts.len(), e);
            TextClusters {
                partition: singletons(texts.len()),
                vectorizer: None,
                vectors: Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vectors() -> Vec<SparseVector> {
        vec![
            SparseVector::from_dense(&[1.0, 0.0, 0.0]),
            SparseVector::from_dense(&[0.9, 0.1, 0.0]),
            SparseVector::from_dense(&[0.0, 1.0, 0.0]),
            SparseVector::from_dense(&[0.0, 0.0, 1.0]),
            SparseVector::from_dense(&[0.0, 0.1, 0.9]),
        ]
    }

    fn assert_partition(partition: &[Vec<usize>], n: usize) {
        let mut seen = vec![0usize; n];
        for group in partition {
            for &i in group {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1), "{:?}", partition);
    }

    #[test]
    fn test_union_find_merges_transitively() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 3);
        uf.union(3, 4);
        assert_eq!(uf.find(0), uf.find(4));
        assert_ne!(uf.find(0), uf.find(1));
        assert_eq!(uf.groups(), vec![vec![0, 3, 4], vec![1], vec![2]]);
    }

    #[test]
    fn test_empty_and_single_inputs() {
        assert!(cluster(&[], 0.5).is_empty());
        assert_eq!(cluster(&sample_vectors()[..1], 0.5), vec![vec![0]]);
    }

    #[test]
    fn test_threshold_zero_merges_everything() {
        let partition = cluster(&sample_vectors(), 0.0);
        assert_eq!(partition, vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn test_unreachable_threshold_isolates_everything() {
        let partition = cluster(&sample_vectors(), 1.01);
        assert_eq!(partition.len(), 5);
        assert_partition(&partition, 5);
    }

    #[test]
    fn test_moderate_threshold_groups_neighbours() {
        let partition = cluster(&sample_vectors(), 0.5);
        assert_eq!(partition, vec![vec![0, 1], vec![2], vec![3, 4]]);
        assert_partition(&partition, 5);
    }

    #[test]
    fn test_similarity_is_reflexive_and_symmetric() {
        let vectors = sample_vectors();
        for a in &vectors {
            assert!((a.cosine(a) - 1.0).abs() < 1e-9);
            for b in &vectors {
                assert!((a.cosine(b) - b.cosine(a)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_cluster_texts_falls_back_to_singletons() {
        let result = cluster_texts(&["ok", "fine", "sure"], 0.2);
        assert!(result.vectorizer.is_none());
        assert_eq!(result.partition, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_cluster_texts_groups_shared_vocabulary() {
        let texts = [
            "invoice approvals delay payroll every month",
            "invoice approvals delay vendor payments",
            "warehouse scanners keep crashing",
            "warehouse scanners need new batteries",
        ];
        let result = cluster_texts(&texts, 0.3);
        assert!(result.vectorizer.is_some());
        assert_eq!(result.partition, vec![vec![0, 1], vec![2, 3]]);
    }
}
