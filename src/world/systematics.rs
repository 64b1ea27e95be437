use std::collections::BTreeMap;

/// One node of the phylogeny: a run of organisms that share a phenotype and
/// descend from each other without a phenotypic change in between.
///
/// # Attributes
///
/// * `parent` - taxon this one branched off from, `None` for roots
/// * `info` - the phenotype, as bit patterns so it can be compared exactly
/// * `origin` - generation the first member was evaluated in
/// * `depth` - number of branchings between this taxon and its root
/// * `num_orgs` - living members
/// * `total_orgs` - members ever recorded
/// * `children` - child taxa still held in the tree
#[derive(Clone, Debug, PartialEq)]
pub struct Taxon {
    pub id: usize,
    pub parent: Option<usize>,
    pub info: Vec<u64>,
    pub origin: usize,
    pub depth: usize,
    pub num_orgs: usize,
    pub total_orgs: usize,
    pub children: Vec<usize>,
}

/// Per-generation summary of the phylogeny.
///
/// # Attributes
///
/// * `active_taxa` - taxa with at least one living member
/// * `ancestor_taxa` - extinct taxa kept because a living taxon descends from them
/// * `phylogenetic_diversity` - branches in the pruned tree (taxa minus one)
/// * `total_orgs` - living organisms counted
/// * `ave_depth` - mean taxon depth over living organisms
/// * `num_roots` - independent trees
/// * `mrca_depth` - depth of the most recent common ancestor, `-1` with several roots
/// * `diversity` - shannon entropy (bits) of organisms over active taxa
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhylogenyStats {
    pub active_taxa: usize,
    pub ancestor_taxa: usize,
    pub phylogenetic_diversity: usize,
    pub total_orgs: usize,
    pub ave_depth: f64,
    pub num_roots: usize,
    pub mrca_depth: i64,
    pub diversity: f64,
}

/// Phenotype-based phylogeny. An offspring joins its parent's taxon when the
/// phenotypes match exactly and founds a child taxon otherwise. Extinct taxa
/// with no descendants left are pruned straight away.
///
/// Organisms of a replaced generation are only removed on the next `flush`,
/// so their taxa are still around when the offspring are added.
#[derive(Clone, Debug, Default)]
pub struct Systematics {
    taxa: BTreeMap<usize, Taxon>,
    next_id: usize,
    retiring: Vec<usize>,
}

// -0.0 and 0.0 are the same phenotype
fn phenotype_key(phenotype: &[f64]) -> Vec<u64> {
    phenotype.iter().map(|score| (score + 0.0).to_bits()).collect()
}

impl Systematics {
    pub fn new() -> Systematics {
        Systematics::default()
    }

    pub fn get_taxon(&self, id: usize) -> Option<&Taxon> {
        self.taxa.get(&id)
    }

    pub fn num_taxa(&self) -> usize {
        self.taxa.len()
    }

    /// Records one organism and returns the id of the taxon it belongs to.
    pub fn add_org(
        &mut self,
        phenotype: &[f64],
        parent: Option<usize>,
        generation: usize,
    ) -> usize {
        let info = phenotype_key(phenotype);

        // an unknown parent is treated as no parent at all
        let parent = parent.filter(|id| self.taxa.contains_key(id));

        if let Some(parent_id) = parent {
            if let Some(parent_taxon) = self.taxa.get_mut(&parent_id) {
                if parent_taxon.info == info {
                    parent_taxon.num_orgs += 1;
                    parent_taxon.total_orgs += 1;
                    return parent_id;
                }
            }
        }

        let id = self.next_id;
        self.next_id += 1;

        let depth = match parent.and_then(|parent_id| self.taxa.get_mut(&parent_id)) {
            Some(parent_taxon) => {
                parent_taxon.children.push(id);
                parent_taxon.depth + 1
            }
            None => 0,
        };

        self.taxa.insert(
            id,
            Taxon {
                id,
                parent,
                info,
                origin: generation,
                depth,
                num_orgs: 1,
                total_orgs: 1,
                children: Vec::new(),
            },
        );
        id
    }

    /// Takes one living organism away from `id`, pruning whatever goes
    /// extinct without descendants.
    pub fn remove_org(&mut self, id: usize) {
        if let Some(taxon) = self.taxa.get_mut(&id) {
            taxon.num_orgs = taxon.num_orgs.saturating_sub(1);
        }
        self.prune(id);
    }

    /// Queues organisms of a replaced generation for removal on `flush`.
    pub fn retire<I: IntoIterator<Item = usize>>(&mut self, taxa: I) {
        self.retiring.extend(taxa);
    }

    pub fn flush(&mut self) {
        for id in std::mem::take(&mut self.retiring) {
            self.remove_org(id);
        }
    }

    // walks up from `id` removing extinct leaves
    fn prune(&mut self, id: usize) {
        let mut current = Some(id);
        while let Some(id) = current {
            let removable = match self.taxa.get(&id) {
                Some(taxon) => taxon.num_orgs == 0 && taxon.children.is_empty(),
                None => false,
            };
            if !removable {
                break;
            }

            let parent = self.taxa.remove(&id).and_then(|taxon| taxon.parent);
            if let Some(parent_id) = parent {
                if let Some(parent_taxon) = self.taxa.get_mut(&parent_id) {
                    parent_taxon.children.retain(|child| *child != id);
                }
            }
            current = parent;
        }
    }

    pub fn stats(&self) -> PhylogenyStats {
        let mut active_taxa = 0;
        let mut total_orgs = 0;
        let mut depth_sum = 0.0;
        let mut roots = Vec::new();

        for taxon in self.taxa.values() {
            if taxon.num_orgs > 0 {
                active_taxa += 1;
                total_orgs += taxon.num_orgs;
                depth_sum += (taxon.depth * taxon.num_orgs) as f64;
            }
            if taxon.parent.is_none() {
                roots.push(taxon.id);
            }
        }

        let ave_depth = if total_orgs > 0 {
            depth_sum / total_orgs as f64
        } else {
            0.0
        };

        let mut diversity = 0.0;
        for taxon in self.taxa.values().filter(|taxon| taxon.num_orgs > 0) {
            let p = taxon.num_orgs as f64 / total_orgs as f64;
            diversity -= p * p.log2();
        }

        let mrca_depth = match roots.as_slice() {
            [root] => self.mrca_below(*root),
            _ => -1,
        };

        PhylogenyStats {
            active_taxa,
            ancestor_taxa: self.taxa.len() - active_taxa,
            phylogenetic_diversity: self.taxa.len().saturating_sub(1),
            total_orgs,
            ave_depth,
            num_roots: roots.len(),
            mrca_depth,
            diversity,
        }
    }

    // follows single-child chains of extinct taxa down from the root
    fn mrca_below(&self, root: usize) -> i64 {
        let mut current = root;
        while let Some(taxon) = self.taxa.get(&current) {
            match taxon.children.as_slice() {
                [only_child] if taxon.num_orgs == 0 => current = *only_child,
                _ => return taxon.depth as i64,
            }
        }
        -1
    }
}
