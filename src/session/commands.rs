//! The ZVIEW command table and its handlers.

use super::Session;
use crate::display::{AutoCutMethod, DistKind, get_names};
use crate::error::{GviewError, Result};
use crate::model::{AstroImage, Region};
use std::path::Path;
use std::sync::Arc;

type Handler = fn(&mut Session, &[&str]) -> Result<()>;

/// One entry of the command table.
pub struct Command {
    pub name: &'static str,
    /// Full help text; the first line is the usage.
    pub doc: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    handler: Handler,
}

impl Command {
    /// First line of the help text.
    #[must_use]
    pub fn usage(&self) -> &'static str {
        self.doc.lines().next().unwrap_or(self.name)
    }

    pub(super) fn run(&self, session: &mut Session, args: &[&str]) -> Result<()> {
        if args.len() < self.min_args || self.max_args.is_some_and(|max| args.len() > max) {
            return Err(GviewError::usage(self.usage()));
        }
        (self.handler)(session, args)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command").field("name", &self.name).finish_non_exhaustive()
    }
}

/// All commands, sorted by name.
static COMMANDS: &[Command] = &[
    Command {
        name: "?",
        doc: "? [cmd]\n\nSynonym for `help'.",
        min_args: 0,
        max_args: Some(1),
        handler: cmd_help,
    },
    Command {
        name: "cd",
        doc: "cd [path]\n\nChange the current working directory to `path` (default: home).",
        min_args: 0,
        max_args: Some(1),
        handler: cmd_cd,
    },
    Command {
        name: "cm",
        doc: "cm [<cm_name> | inv]\n\nSet a color map (`cm_name`) for the current viewer. Special\nvalue 'inv' means to invert the current colormap.\n\nIf no value is given, reports the current color map.",
        min_args: 0,
        max_args: Some(1),
        handler: cmd_cm,
    },
    Command {
        name: "cuts",
        doc: "cuts [lo hi | method]\n\nSet the cut levels of the current viewer, or choose an autocut\nmethod (zscale, minmax, histogram, median) and apply it.\n\nIf no value is given, reports the current cut levels.",
        min_args: 0,
        max_args: Some(2),
        handler: cmd_cuts,
    },
    Command {
        name: "dist",
        doc: "dist [<dist_name>]\n\nSet a color distribution (`dist_name`) for the current viewer.\nPossible values are linear, log, power, sqrt, squared, asinh, sinh,\nand histeq.\n\nIf no value is given, reports the current color distribution\nalgorithm.",
        min_args: 0,
        max_args: Some(1),
        handler: cmd_dist,
    },
    Command {
        name: "exit",
        doc: "exit\n\nSynonym for `quit'.",
        min_args: 0,
        max_args: Some(0),
        handler: cmd_quit,
    },
    Command {
        name: "head",
        doc: "head buf [kwd ...]\n\nList the headers for the image in the named buffer.",
        min_args: 1,
        max_args: None,
        handler: cmd_head,
    },
    Command {
        name: "help",
        doc: "help [cmd]\n\nGet general help, or help for command `cmd`.",
        min_args: 0,
        max_args: Some(1),
        handler: cmd_help,
    },
    Command {
        name: "ls",
        doc: "ls [options]\n\nExecute list files command in the current working directory.",
        min_args: 0,
        max_args: None,
        handler: cmd_ls,
    },
    Command {
        name: "lsb",
        doc: "lsb\n\nList the buffers.",
        min_args: 0,
        max_args: Some(0),
        handler: cmd_lsb,
    },
    Command {
        name: "lscm",
        doc: "lscm\n\nList the possible color maps that can be loaded.",
        min_args: 0,
        max_args: Some(0),
        handler: cmd_lscm,
    },
    Command {
        name: "lsdist",
        doc: "lsdist\n\nList the possible color distributions.",
        min_args: 0,
        max_args: Some(0),
        handler: cmd_lsdist,
    },
    Command {
        name: "lsv",
        doc: "lsv\n\nList the viewers, showing the current one.",
        min_args: 0,
        max_args: Some(0),
        handler: cmd_lsv,
    },
    Command {
        name: "mkv",
        doc: "mkv name [width height]\n\nMake a viewer with name NAME and make it current.\n\nOptional:\n`width` and `height` specify the pixel dimensions of the view pane.",
        min_args: 1,
        max_args: Some(3),
        handler: cmd_mkv,
    },
    Command {
        name: "pan",
        doc: "pan [x y]\n\nCenter the current viewer on FITS pixel (x, y).\n\nIf no position is given, reports the current pan position.",
        min_args: 0,
        max_args: Some(2),
        handler: cmd_pan,
    },
    Command {
        name: "pick",
        doc: "pick [x y]\n\nFind the object nearest FITS pixel (x, y) in the current viewer\n(default: the cursor position) and report its position, FWHM and\nseeing size.",
        min_args: 0,
        max_args: Some(2),
        handler: cmd_pick,
    },
    Command {
        name: "pwd",
        doc: "pwd\n\nList the current working directory.",
        min_args: 0,
        max_args: Some(0),
        handler: cmd_pwd,
    },
    Command {
        name: "quit",
        doc: "quit\n\nQuit gview.",
        min_args: 0,
        max_args: Some(0),
        handler: cmd_quit,
    },
    Command {
        name: "rd",
        doc: "rd bufname path\n\nRead file from `path` into buffer `bufname`.  If the buffer does\nnot exist it will be created.\n\nIf `path` is not absolute it is assumed to be relative\nto the current working directory.",
        min_args: 2,
        max_args: None,
        handler: cmd_rd,
    },
    Command {
        name: "rm",
        doc: "rm NAME ...\n\nCommand to be deprecated--use 'rmb'.",
        min_args: 0,
        max_args: None,
        handler: cmd_rm,
    },
    Command {
        name: "rmb",
        doc: "rmb NAME ...\n\nRemove buffer NAME.",
        min_args: 0,
        max_args: None,
        handler: cmd_rmb,
    },
    Command {
        name: "rmv",
        doc: "rmv NAME\n\nDelete viewer NAME.",
        min_args: 1,
        max_args: Some(1),
        handler: cmd_rmv,
    },
    Command {
        name: "stat",
        doc: "stat buf [x1 y1 x2 y2]\n\nStatistics of the image in buffer `buf`, or of the region between\nFITS pixels (x1, y1) and (x2, y2) inclusive.",
        min_args: 1,
        max_args: Some(5),
        handler: cmd_stat,
    },
    Command {
        name: "swv",
        doc: "swv name\n\nSwitch the current viewer to NAME.",
        min_args: 1,
        max_args: Some(1),
        handler: cmd_swv,
    },
    Command {
        name: "tv",
        doc: "tv <bufname> [min max] [bw | inv | jt]\n\nThis command provided for ZVIEW compatibility.",
        min_args: 1,
        max_args: Some(4),
        handler: cmd_tv,
    },
    Command {
        name: "v",
        doc: "v bufname [min max] [colormap]\n\nDisplay buffer `bufname` in the current viewer.  If no viewer\nexists one will be created.\n\nOptional:\n`min` and `max` specify lo/hi cut levels to scale the image\ndata for display.\n\n`colormap` specifies a color map to use for the image.",
        min_args: 1,
        max_args: Some(4),
        handler: cmd_v,
    },
    Command {
        name: "wf",
        doc: "wf buf path\n\nWrite the image in buffer `buf` to FITS file `path`.",
        min_args: 2,
        max_args: Some(2),
        handler: cmd_wf,
    },
    Command {
        name: "zoom",
        doc: "zoom [level | fit]\n\nSet the zoom level of the current viewer. Each level is one zoom\nstep (x1.4); 0 shows the image 1:1 and `fit` fits it to the window.\n\nIf no value is given, reports the current zoom level.",
        min_args: 0,
        max_args: Some(1),
        handler: cmd_zoom,
    },
];

/// Look up a command by name (case-insensitive).
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Command> {
    let name = name.to_lowercase();
    COMMANDS
        .binary_search_by(|c| c.name.cmp(name.as_str()))
        .ok()
        .map(|i| &COMMANDS[i])
}

/// All commands, sorted by name.
#[must_use]
pub fn commands() -> &'static [Command] {
    COMMANDS
}

/// Closest known command name to a mistyped one.
#[must_use]
pub fn suggest(name: &str) -> Option<&'static str> {
    use strsim::{jaro_winkler, levenshtein};

    let name = name.to_lowercase();
    COMMANDS
        .iter()
        .filter(|c| c.name.len() > 1)
        .map(|c| (c.name, jaro_winkler(&name, c.name), levenshtein(&name, c.name)))
        .filter(|&(_, score, dist)| score >= 0.8 || dist <= 1)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _, _)| n)
}

// ============================================================================
// Argument helpers
// ============================================================================

fn parse_f64(arg: &str) -> Result<f64> {
    arg.parse()
        .map_err(|_| GviewError::invalid_argument(arg, "expected a number"))
}

fn parse_u32(arg: &str) -> Result<u32> {
    arg.parse()
        .map_err(|_| GviewError::invalid_argument(arg, "expected a positive integer"))
}

/// FITS (1-based) pixel coordinate to a 0-based index.
fn parse_fits_index(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(v) if v >= 1 => Ok(v - 1),
        _ => Err(GviewError::invalid_argument(arg, "expected a FITS pixel number (>= 1)")),
    }
}

// ============================================================================
// Files and directories
// ============================================================================

fn cmd_cd(s: &mut Session, args: &[&str]) -> Result<()> {
    let target = match args.first() {
        Some(path) => s.resolve_path(path),
        None => dirs::home_dir().ok_or_else(|| GviewError::invalid_argument("~", "no home directory"))?,
    };
    let target = target
        .canonicalize()
        .map_err(|e| GviewError::io(&target, e))?;
    if !target.is_dir() {
        return Err(GviewError::invalid_argument(
            target.display().to_string(),
            "not a directory",
        ));
    }
    s.cwd = target;
    cmd_pwd(s, &[])
}

fn cmd_ls(s: &mut Session, args: &[&str]) -> Result<()> {
    let output = std::process::Command::new("ls")
        .args(args)
        .current_dir(&s.cwd)
        .output()
        .map_err(|e| GviewError::io(&s.cwd, e))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    for text in [stdout.trim_end(), stderr.trim_end()] {
        if !text.is_empty() {
            s.log(text);
        }
    }
    Ok(())
}

fn cmd_pwd(s: &mut Session, _args: &[&str]) -> Result<()> {
    let cwd = s.cwd.display().to_string();
    s.log(&cwd);
    Ok(())
}

fn cmd_rd(s: &mut Session, args: &[&str]) -> Result<()> {
    let (bufname, path) = (args[0], s.resolve_path(args[1]));
    if s.buffers.contains_key(bufname) {
        s.log(&format!(
            "Buffer {bufname} is in use. Will discard the previous data"
        ));
    }
    s.log(&format!("Reading file...({})", path.display()));
    let image = AstroImage::load_file(&path)?;
    s.buffers.insert(bufname.to_string(), Arc::new(image));
    s.log("File read");
    Ok(())
}

fn cmd_wf(s: &mut Session, args: &[&str]) -> Result<()> {
    let image = s.require_buffer(args[0])?;
    let path = s.resolve_path(args[1]);
    image.save_as(&path)?;
    s.log(&format!("Wrote {}", path.display()));
    Ok(())
}

// ============================================================================
// Display
// ============================================================================

fn cmd_v(s: &mut Session, args: &[&str]) -> Result<()> {
    let bufname = args[0];
    let Some(image) = s.buffers.get(bufname).cloned() else {
        s.log(&format!("!! No such buffer: '{bufname}'"));
        return Ok(());
    };

    let mut rest = &args[1..];
    let mut cuts = None;
    if let Some(lo) = rest.first().and_then(|a| a.parse::<f64>().ok()) {
        let hi = rest
            .get(1)
            .ok_or_else(|| GviewError::usage("v bufname [min max] [colormap]"))?;
        cuts = Some((lo, parse_f64(hi)?));
        rest = &rest[2..];
    }
    let cmap = match rest {
        [] => None,
        [name] => Some(*name),
        _ => return Err(GviewError::usage("v bufname [min max] [colormap]")),
    };

    let viewer = s.current_or_default_viewer()?;
    viewer.set_image(image);
    if let Some((lo, hi)) = cuts {
        viewer.cut_levels(lo, hi);
    }
    match cmap {
        Some("inv") => viewer.invert_cmap(),
        Some(name) => viewer.set_color_map(name)?,
        None => {}
    }
    Ok(())
}

fn cmd_tv(s: &mut Session, args: &[&str]) -> Result<()> {
    let Some((bufname, rest)) = args.split_first() else {
        return Err(GviewError::usage("tv bufname [min max] [bw|inv|jt]"));
    };
    let mapped: Vec<&str> = std::iter::once(*bufname)
        .chain(rest.iter().map(|&a| match a {
            "bw" => "gray",
            "jt" => "rainbow3",
            other => other,
        }))
        .collect();
    cmd_v(s, &mapped)
}

fn cmd_cm(s: &mut Session, args: &[&str]) -> Result<()> {
    let Some(viewer) = s.current_viewer_mut() else {
        s.log("No viewers");
        return Ok(());
    };
    match args.first() {
        None => {
            let name = viewer.color_map_name().to_string();
            s.log(&name);
        }
        Some(&"inv") => viewer.invert_cmap(),
        Some(name) => viewer.set_color_map(name)?,
    }
    Ok(())
}

fn cmd_dist(s: &mut Session, args: &[&str]) -> Result<()> {
    let Some(viewer) = s.current_viewer_mut() else {
        s.log("No viewers");
        return Ok(());
    };
    match args.first() {
        None => {
            let name = viewer.color_algorithm().as_str();
            s.log(name);
        }
        Some(name) => viewer.set_color_algorithm(name)?,
    }
    Ok(())
}

fn cmd_lscm(s: &mut Session, _args: &[&str]) -> Result<()> {
    s.log(&get_names().join("\n"));
    Ok(())
}

fn cmd_lsdist(s: &mut Session, _args: &[&str]) -> Result<()> {
    s.log(&DistKind::names().join("\n"));
    Ok(())
}

fn cmd_cuts(s: &mut Session, args: &[&str]) -> Result<()> {
    let Some(viewer) = s.current_viewer_mut() else {
        s.log("No viewers");
        return Ok(());
    };
    match args {
        [] => {
            let (lo, hi) = viewer.cuts();
            let method = viewer.autocut_method();
            s.log(&format!("cut levels: {lo} {hi} (autocut: {method})"));
        }
        [method] => viewer.set_autocut_method(method.parse::<AutoCutMethod>()?),
        [lo, hi] => viewer.cut_levels(parse_f64(lo)?, parse_f64(hi)?),
        _ => unreachable!("arity checked by the command table"),
    }
    Ok(())
}

fn cmd_zoom(s: &mut Session, args: &[&str]) -> Result<()> {
    let Some(viewer) = s.current_viewer_mut() else {
        s.log("No viewers");
        return Ok(());
    };
    match args.first() {
        None => {
            let text = format!(
                "zoom level {:.2} (scale {:.3}){}",
                viewer.zoom_level(),
                viewer.scale(),
                if viewer.is_autozoom() { " fit" } else { "" }
            );
            s.log(&text);
        }
        Some(&"fit") => viewer.zoom_fit(),
        Some(level) => {
            let level = level
                .parse::<i32>()
                .map_err(|_| GviewError::invalid_argument(*level, "expected an integer or 'fit'"))?;
            viewer.zoom_to(level);
        }
    }
    Ok(())
}

fn cmd_pan(s: &mut Session, args: &[&str]) -> Result<()> {
    let Some(viewer) = s.current_viewer_mut() else {
        s.log("No viewers");
        return Ok(());
    };
    match args {
        [] => {
            let (x, y) = viewer.pan();
            s.log(&format!("pan position: {:.2} {:.2}", x + 1.0, y + 1.0));
        }
        [x, y] => viewer.pan_to(parse_f64(x)? - 1.0, parse_f64(y)? - 1.0),
        _ => return Err(GviewError::usage("pan [x y]")),
    }
    Ok(())
}

fn cmd_pick(s: &mut Session, args: &[&str]) -> Result<()> {
    let position = match args {
        [] => None,
        [x, y] => Some((parse_f64(x)? - 1.0, parse_f64(y)? - 1.0)),
        _ => return Err(GviewError::usage("pick [x y]")),
    };
    let lines = s.pick(position)?.lines();
    s.log(&lines.join("\n"));
    Ok(())
}

// ============================================================================
// Viewers
// ============================================================================

fn cmd_mkv(s: &mut Session, args: &[&str]) -> Result<()> {
    let name = args[0];
    let (width, height) = match &args[1..] {
        [] => (s.config.viewer.width, s.config.viewer.height),
        [w, h] => (parse_u32(w)?, parse_u32(h)?),
        _ => return Err(GviewError::usage("mkv name [width height]")),
    };
    if s.viewers.contains_key(name) {
        s.log(&format!("Viewer {name} exists. Replacing it"));
    }
    s.make_viewer(name, width, height)?;
    s.current = Some(name.to_string());
    Ok(())
}

fn cmd_lsv(s: &mut Session, _args: &[&str]) -> Result<()> {
    if s.viewers.is_empty() {
        s.log("No viewers");
        return Ok(());
    }
    let lines: Vec<String> = s
        .viewers
        .keys()
        .map(|name| {
            let mark = if s.current.as_deref() == Some(name.as_str()) { '>' } else { ' ' };
            format!("{mark}{name}")
        })
        .collect();
    s.log(&lines.join("\n"));
    Ok(())
}

fn cmd_swv(s: &mut Session, args: &[&str]) -> Result<()> {
    let name = args[0];
    if s.viewers.contains_key(name) {
        s.current = Some(name.to_string());
    } else {
        s.log(&format!("No such viewer: '{name}'"));
    }
    Ok(())
}

fn cmd_rmv(s: &mut Session, args: &[&str]) -> Result<()> {
    let name = args[0];
    if !s.delete_viewer(name) {
        s.log(&format!("No such viewer: '{name}'"));
    }
    Ok(())
}

// ============================================================================
// Buffers
// ============================================================================

fn cmd_head(s: &mut Session, args: &[&str]) -> Result<()> {
    let bufname = args[0];
    let Some(image) = s.buffers.get(bufname).cloned() else {
        s.log(&format!("No such buffer: '{bufname}'"));
        return Ok(());
    };
    let header = image.header();
    let lines: Vec<String> = if args.len() > 1 {
        args[1..]
            .iter()
            .map(|kwd| match header.card(&kwd.to_uppercase()) {
                Some(card) => format!("{kwd:<8.8}  {}", card.display_value()),
                None => format!("{kwd:<8.8}  -- NOT FOUND IN HEADER --"),
            })
            .collect()
    } else {
        header
            .cards()
            .map(|card| format!("{:<8.8}  {}", card.keyword, card.display_value()))
            .collect()
    };
    s.log(&lines.join("\n"));
    Ok(())
}

fn cmd_lsb(s: &mut Session, _args: &[&str]) -> Result<()> {
    if s.buffers.is_empty() {
        s.log("No buffers");
        return Ok(());
    }
    let lines: Vec<String> = s
        .buffers
        .iter()
        .map(|(name, image)| {
            let size = format!("{}x{}", image.width(), image.height());
            let path = image
                .path()
                .map_or_else(|| "None".to_string(), |p| p.display().to_string());
            format!("{name:<10.10}  {size:>13}  {path}")
        })
        .collect();
    s.log(&lines.join("\n"));
    Ok(())
}

fn cmd_rmb(s: &mut Session, args: &[&str]) -> Result<()> {
    for name in args {
        if s.buffers.remove(*name).is_none() {
            s.log(&format!("No such buffer: '{name}'"));
        }
    }
    cmd_lsb(s, &[])
}

fn cmd_rm(s: &mut Session, args: &[&str]) -> Result<()> {
    s.log("warning: this command will be deprecated--use 'rmb'");
    cmd_rmb(s, args)
}

fn cmd_stat(s: &mut Session, args: &[&str]) -> Result<()> {
    let image = s.require_buffer(args[0])?;
    let region = match &args[1..] {
        [] => None,
        [x1, y1, x2, y2] => Some(Region {
            x1: parse_fits_index(x1)?,
            y1: parse_fits_index(y1)?,
            x2: parse_fits_index(x2)?,
            y2: parse_fits_index(y2)?,
        }),
        _ => return Err(GviewError::usage("stat buf [x1 y1 x2 y2]")),
    };
    let stats = image.statistics(region)?;
    s.log(&format!(
        "npix: {}  min: {}  max: {}  mean: {:.4}  median: {:.4}  stddev: {:.4}",
        stats.count, stats.min, stats.max, stats.mean, stats.median, stats.stddev
    ));
    Ok(())
}

// ============================================================================
// Session
// ============================================================================

fn cmd_help(s: &mut Session, args: &[&str]) -> Result<()> {
    if let Some(name) = args.first() {
        let name = name.to_lowercase();
        match lookup(&name) {
            Some(cmd) => s.log(&format!("{name}: {}", cmd.doc)),
            None => s.log(&format!(
                "No such command '{name}'; type help for general help."
            )),
        }
    } else {
        let text: Vec<String> = COMMANDS
            .iter()
            .map(|cmd| format!("{}: {}", cmd.name, cmd.doc))
            .collect();
        s.log(&text.join("\n"));
    }
    Ok(())
}

fn cmd_quit(s: &mut Session, _args: &[&str]) -> Result<()> {
    s.quit = true;
    Ok(())
}

/// Resolve `path` against `cwd` unless it is absolute.
pub(super) fn resolve(cwd: &Path, path: &str) -> std::path::PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sorted_and_documented() {
        let names: Vec<_> = COMMANDS.iter().map(|c| c.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        for cmd in COMMANDS {
            assert!(!cmd.doc.is_empty());
            assert!(cmd.usage().starts_with(cmd.name), "{}", cmd.name);
        }
    }

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(lookup("HELP").map(|c| c.name), Some("help"));
        assert_eq!(lookup("?").map(|c| c.name), Some("?"));
        assert!(lookup("rdm").is_none());
    }

    #[test]
    fn test_suggest() {
        assert_eq!(suggest("hepl"), Some("help"));
        assert_eq!(suggest("lsvv"), Some("lsv"));
        assert_eq!(suggest("xyzzy"), None);
    }

    #[test]
    fn test_resolve() {
        let cwd = Path::new("/data");
        assert_eq!(resolve(cwd, "a.fits"), Path::new("/data/a.fits"));
        assert_eq!(resolve(cwd, "/tmp/b.fits"), Path::new("/tmp/b.fits"));
    }

    #[test]
    fn test_fits_index() {
        assert_eq!(parse_fits_index("1").unwrap(), 0);
        assert!(parse_fits_index("0").is_err());
        assert!(parse_fits_index("-3").is_err());
    }
}
