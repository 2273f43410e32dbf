use crate::creators::TreeCreator;
use crate::dataset::Variable;
use crate::error::{Result, ensure_config};
use crate::grammar::Grammar;
use crate::mutation::{MultiMutation, Mutation};

#[rustfmt::skip]
macro_rules! osgp_mutation_weights_spec {
    ($m:ident) => {
        $m! {
            one_point:
                (f64, 1.0, "mw-one-point"),
            multi_point:
                (f64, 0.0, "mw-multi-point"),
            change_variable:
                (f64, 1.0, "mw-change-variable"),
            change_function:
                (f64, 1.0, "mw-change-function"),
            insert_subtree:
                (f64, 1.0, "mw-insert-subtree"),
            replace_subtree:
                (f64, 1.0, "mw-replace-subtree"),
            shuffle_subtrees:
                (f64, 1.0, "mw-shuffle-subtrees"),
        }
    };
}

#[rustfmt::skip]
macro_rules! osgp_config_spec {
    ($m:ident) => {
        $m! {
            values {
                seed:
                    (u64, 0, "seed"),
                generations:
                    (usize, 1000, "generations"),
                population_size:
                    (usize, 1000, "population-size"),
                evaluations:
                    (u64, 1_000_000, "evaluations"),
                iterations:
                    (usize, 50, "iterations"),
                crossover_probability:
                    (f64, 1.0, "crossover-probability"),
                mutation_probability:
                    (f64, 0.25, "mutation-probability"),
                max_selection_pressure:
                    (f64, 100.0, "max-selection-pressure"),
                max_length:
                    (usize, 50, "max-length"),
                max_depth:
                    (usize, 12, "max-depth"),
                threads:
                    (usize, 0, "threads"),
            }
            neg_flags {
                progress:
                    (true, no_progress, "no-progress"),
            }
        }
    };
}

#[rustfmt::skip]
macro_rules! __define_mutation_weights {
    ( $( $name:ident: ($ty:ty, $default:expr, $cli_long:literal), )* ) => {
        /// Relative weights of the mutation operators in the default dispatcher.
        #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
        #[cfg_attr(feature = "serde", serde(default))]
        #[derive(Clone, Debug, PartialEq)]
        pub struct MutationWeights {
            $(pub $name: $ty,)*
        }

        impl Default for MutationWeights {
            fn default() -> Self {
                Self { $($name: $default,)* }
            }
        }

        impl MutationWeights {
            fn all(&self) -> Vec<(&'static str, f64)> {
                vec![$((stringify!($name), self.$name),)*]
            }
        }
    };
}

osgp_mutation_weights_spec!(__define_mutation_weights);

macro_rules! __define_config {
    (
        values { $( $name:ident: ($ty:ty, $default:expr, $cli_long:literal), )* }
        neg_flags { $( $iname:ident: ($bdefault:expr, $cli_name:ident, $cli_blong:literal), )* }
    ) => {
        /// Run parameters, fixed for the duration of a run.
        #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
        #[cfg_attr(feature = "serde", serde(default))]
        #[derive(Clone, Debug, PartialEq)]
        pub struct GeneticAlgorithmConfig {
            $(pub $name: $ty,)*
            $(pub $iname: bool,)*

            pub mutation_weights: MutationWeights,
        }

        impl Default for GeneticAlgorithmConfig {
            fn default() -> Self {
                Self {
                    $($name: $default,)*
                    $($iname: $bdefault,)*
                    mutation_weights: MutationWeights::default(),
                }
            }
        }
    };
}

osgp_config_spec!(__define_config);

impl GeneticAlgorithmConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_config!(self.population_size > 0, "population_size must be positive");
        ensure_config!(self.max_length > 0, "max_length must be positive");
        ensure_config!(self.max_depth > 0, "max_depth must be positive");
        ensure_config!(
            (0.0..=1.0).contains(&self.crossover_probability),
            "crossover_probability must lie in [0, 1], got {}",
            self.crossover_probability
        );
        ensure_config!(
            (0.0..=1.0).contains(&self.mutation_probability),
            "mutation_probability must lie in [0, 1], got {}",
            self.mutation_probability
        );
        ensure_config!(
            self.max_selection_pressure >= 0.0,
            "max_selection_pressure must be a non-negative number, got {}",
            self.max_selection_pressure
        );
        for (name, w) in self.mutation_weights.all() {
            ensure_config!(w.is_finite() && w >= 0.0, "mutation weight {name} must be finite and >= 0, got {w}");
        }
        Ok(())
    }
}

impl MutationWeights {
    /// The weighted dispatcher these weights describe.
    pub fn build<'a>(
        &self,
        grammar: &'a Grammar,
        variables: &'a [Variable],
        creator: &'a TreeCreator<'a>,
        max_depth: usize,
        max_length: usize,
    ) -> MultiMutation<'a> {
        MultiMutation::new(vec![
            (Mutation::OnePoint { sigma: 1.0 }, self.one_point),
            (Mutation::MultiPoint { sigma: 1.0 }, self.multi_point),
            (Mutation::ChangeVariable { variables }, self.change_variable),
            (Mutation::ChangeFunction { grammar }, self.change_function),
            (
                Mutation::InsertSubtree {
                    creator,
                    max_depth,
                    max_length,
                },
                self.insert_subtree,
            ),
            (
                Mutation::ReplaceSubtree {
                    creator,
                    max_depth,
                    max_length,
                },
                self.replace_subtree,
            ),
            (Mutation::ShuffleSubtrees, self.shuffle_subtrees),
        ])
    }
}

#[cfg(feature = "cli")]
pub(crate) mod cli_args {
    use clap::Args;

    use super::{GeneticAlgorithmConfig, MutationWeights};

    macro_rules! __define_mutation_weights_args {
        ( $( $name:ident: ($ty:ty, $default:expr, $cli_long:literal), )* ) => {
            #[derive(Args, Debug, Clone, Default)]
            pub struct MutationWeightsArgs {
                $(#[arg(long = $cli_long)] pub $name: Option<$ty>,)*
            }

            impl MutationWeightsArgs {
                pub fn apply_to(&self, w: &mut MutationWeights) {
                    $(if let Some(v) = self.$name { w.$name = v; })*
                }
            }
        };
    }

    osgp_mutation_weights_spec!(__define_mutation_weights_args);

    macro_rules! __define_config_args {
        (
            values { $( $name:ident: ($ty:ty, $default:expr, $cli_long:literal), )* }
            neg_flags { $( $iname:ident: ($bdefault:expr, $cli_name:ident, $cli_blong:literal), )* }
        ) => {
            /// Command-line patch over [`GeneticAlgorithmConfig`]; unset flags keep the defaults.
            #[derive(Args, Debug, Clone, Default)]
            pub struct ConfigArgs {
                $(
                    #[arg(long = $cli_long)]
                    pub $name: Option<$ty>,
                )*

                $(
                    #[arg(long = $cli_blong)]
                    pub $cli_name: bool,
                )*

                #[command(flatten)]
                pub mutation_weights: MutationWeightsArgs,
            }

            impl ConfigArgs {
                pub fn apply_to(&self, cfg: &mut GeneticAlgorithmConfig) {
                    $(
                        if let Some(v) = self.$name {
                            cfg.$name = v;
                        }
                    )*

                    $(
                        if self.$cli_name {
                            cfg.$iname = false;
                        }
                    )*

                    self.mutation_weights.apply_to(&mut cfg.mutation_weights);
                }
            }
        };
    }

    osgp_config_spec!(__define_config_args);
}
