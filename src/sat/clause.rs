use crate::sat::assignment::Assignment;
use crate::sat::literal::Literal;
use core::ops::Index;
use smallvec::SmallVec;

/// An immutable disjunction of literals, as read from the input.
///
/// Duplicates are kept as given; the backtrackable representations collapse them when
/// they wrap the clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause {
    literals: SmallVec<[Literal; 8]>,
}

impl Clause {
    pub fn new<I: IntoIterator<Item = Literal>>(literals: I) -> Self {
        Self {
            literals: literals.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    #[must_use]
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.iter()
            .any(|&lit| assignment.literal_value(lit) == Some(true))
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<Literal>> for Clause {
    fn from(literals: Vec<Literal>) -> Self {
        Self::new(literals)
    }
}

impl From<&[i32]> for Clause {
    fn from(literals: &[i32]) -> Self {
        literals
            .iter()
            .filter(|&&l| l != 0)
            .map(|&l| Literal::from_dimacs(l))
            .collect()
    }
}
