//! Common display utilities for CLI commands.

use colored::Colorize;
use ripple::ImpactReport;

/// Print every changed module followed by the importers it selected, indented.
pub fn print_impact(report: &ImpactReport) {
    for changed in &report.changed {
        println!("{}", changed.module);
        for importer in &changed.selected_importers {
            println!("    {importer}");
        }
    }
}

/// Print a titled list of modules, or a dimmed placeholder when empty.
pub fn print_module_list<'a>(title: &str, modules: impl IntoIterator<Item = &'a String>, empty_message: &str) {
    println!("{}:", title.white().bold());
    let mut any = false;
    for module in modules {
        any = true;
        println!("    {} {module}", "•".dimmed());
    }
    if !any {
        println!("    {}", empty_message.dimmed());
    }
}
