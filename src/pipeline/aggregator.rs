// file: src/pipeline/aggregator.rs
// description: folds parsed source units into the repository summary
// reference: commutative accumulation over per-file results

use crate::models::{
    DeclKind, DiscoveryError, ModuleEntry, SourceUnit, Summary, UndocumentedItem,
};

const TOP_MODULES: usize = 10;

/// Incremental fold. Counts are sums, so the order units arrive in never
/// changes them; `parse_errors` and `top_modules` keep arrival order.
#[derive(Debug, Default)]
pub struct SummaryAggregator {
    summary: Summary,
}

impl SummaryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, unit: &SourceUnit) {
        let summary = &mut self.summary;
        summary.files += 1;

        if let Some(error) = &unit.parse_error {
            summary.parse_errors.push(error.clone());
            return;
        }

        summary.modules += 1;
        summary.classes += unit.classes.len();
        summary.functions += unit.functions.len();
        summary.methods += unit.method_count();

        if unit.module_docstring.is_none() {
            summary.missing_module_docs += 1;
        }

        let missing_methods = unit
            .classes
            .iter()
            .flat_map(|c| c.methods.iter())
            .filter(|m| m.docstring.is_none())
            .count();
        let missing_functions = unit.functions.iter().filter(|f| f.docstring.is_none()).count();

        summary.missing_method_docs += missing_methods;
        summary.missing_function_docs += missing_functions + missing_methods;

        if summary.top_modules.len() < TOP_MODULES {
            summary.top_modules.push(ModuleEntry {
                module: unit.module.clone(),
                path: unit.relative_path.clone(),
                classes: unit.classes.len(),
                functions: unit.functions.len(),
                has_doc: unit.module_docstring.is_some(),
            });
        }
    }

    pub fn with_discovery_errors(mut self, errors: Vec<DiscoveryError>) -> Self {
        self.summary.discovery_errors.extend(errors);
        self
    }

    pub fn finish(self) -> Summary {
        self.summary
    }
}

pub fn aggregate<'a, I>(units: I) -> Summary
where
    I: IntoIterator<Item = &'a SourceUnit>,
{
    let mut aggregator = SummaryAggregator::new();
    for unit in units {
        aggregator.add(unit);
    }
    aggregator.finish()
}

/// Every class, function and method without a docstring, with enough position
/// information for a writer to locate it.
pub fn undocumented<'a, I>(units: I) -> Vec<UndocumentedItem>
where
    I: IntoIterator<Item = &'a SourceUnit>,
{
    let mut items = Vec::new();

    for unit in units {
        for class in &unit.classes {
            if class.docstring.is_none() {
                items.push(UndocumentedItem {
                    relative_path: unit.relative_path.clone(),
                    qualified_name: class.name.clone(),
                    kind: DeclKind::Class,
                    line_start: class.line_start,
                    line_end: class.line_end,
                });
            }

            for method in class.methods.iter().filter(|m| m.docstring.is_none()) {
                items.push(UndocumentedItem {
                    relative_path: unit.relative_path.clone(),
                    qualified_name: format!("{}.{}", class.name, method.name),
                    kind: DeclKind::Method,
                    line_start: method.line_start,
                    line_end: method.line_end,
                });
            }
        }

        for function in unit.functions.iter().filter(|f| f.docstring.is_none()) {
            items.push(UndocumentedItem {
                relative_path: unit.relative_path.clone(),
                qualified_name: function.name.clone(),
                kind: DeclKind::Function,
                line_start: function.line_start,
                line_end: function.line_end,
            });
        }
    }

    items
}
