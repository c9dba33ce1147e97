// crates/afv_config/src/tree.rs

//! 控制文件语法树
//!
//! 控制文件是嵌套的键值文本：
//!
//! ```text
//! ;; 注释到行尾
//! io {
//!     mesh_file "grid.msh"
//!     convergence_history_required true
//! }
//! Jacobian_inviscid_flux consistent
//! ```
//!
//! 语法规则：
//! - `{ }` 定界嵌套块，块名与 `{` 同行
//! - 键值对占一行，值可以是多个空白分隔的词（列表）
//! - 字符串用双引号括起
//! - `;;` 行注释
//! - `#include "path"` 文本包含，路径相对于包含方所在目录解析
//!
//! 解析结果是 [`ConfigBlock`] 树，类型化读取由各 `get_*` 方法完成。

use crate::error::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 嵌套配置值
#[derive(Debug, Clone)]
pub enum ConfigValue {
    /// 一行上的词列表（已去引号）
    Values(Vec<String>),
    /// 嵌套块
    Block(ConfigBlock),
}

/// 配置块：键到值的映射
#[derive(Debug, Clone, Default)]
pub struct ConfigBlock {
    entries: HashMap<String, ConfigValue>,
}

impl ConfigBlock {
    /// 从文件解析（处理 #include）
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let expanded = expand_includes(&text, base, 0)?;
        Self::from_str_inner(&expanded)
    }

    /// 从文本解析（include 相对于 `base` 解析）
    pub fn from_text(text: &str, base: &Path) -> ConfigResult<Self> {
        let expanded = expand_includes(text, base, 0)?;
        Self::from_str_inner(&expanded)
    }

    fn from_str_inner(text: &str) -> ConfigResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, strip_comment(l)));
        parse_block(&mut lines, 0)
    }

    /// 子块
    pub fn block(&self, key: &str) -> ConfigResult<&ConfigBlock> {
        match self.entries.get(key) {
            Some(ConfigValue::Block(b)) => Ok(b),
            Some(_) => Err(ConfigError::BadType {
                key: key.to_string(),
                expected: "block",
            }),
            None => Err(ConfigError::Missing {
                key: key.to_string(),
            }),
        }
    }

    /// 可选子块
    pub fn block_opt(&self, key: &str) -> Option<&ConfigBlock> {
        match self.entries.get(key) {
            Some(ConfigValue::Block(b)) => Some(b),
            _ => None,
        }
    }

    /// 是否含键
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn values(&self, key: &str) -> ConfigResult<&[String]> {
        match self.entries.get(key) {
            Some(ConfigValue::Values(v)) => Ok(v),
            Some(_) => Err(ConfigError::BadType {
                key: key.to_string(),
                expected: "value",
            }),
            None => Err(ConfigError::Missing {
                key: key.to_string(),
            }),
        }
    }

    fn scalar(&self, key: &str) -> ConfigResult<&str> {
        let v = self.values(key)?;
        match v.len() {
            1 => Ok(&v[0]),
            _ => Err(ConfigError::BadType {
                key: key.to_string(),
                expected: "single value",
            }),
        }
    }

    /// 字符串值
    pub fn get_str(&self, key: &str) -> ConfigResult<String> {
        Ok(self.scalar(key)?.to_string())
    }

    /// 带默认的字符串值
    pub fn get_str_or(&self, key: &str, default: &str) -> ConfigResult<String> {
        if self.contains(key) {
            self.get_str(key)
        } else {
            Ok(default.to_string())
        }
    }

    /// 浮点值
    pub fn get_f64(&self, key: &str) -> ConfigResult<f64> {
        self.scalar(key)?
            .parse()
            .map_err(|_| ConfigError::BadType {
                key: key.to_string(),
                expected: "real number",
            })
    }

    /// 带默认的浮点值
    pub fn get_f64_or(&self, key: &str, default: f64) -> ConfigResult<f64> {
        if self.contains(key) {
            self.get_f64(key)
        } else {
            Ok(default)
        }
    }

    /// 整型标记值
    pub fn get_i32(&self, key: &str) -> ConfigResult<i32> {
        self.scalar(key)?
            .parse()
            .map_err(|_| ConfigError::BadType {
                key: key.to_string(),
                expected: "integer",
            })
    }

    /// 带默认的整型标记值
    pub fn get_i32_or(&self, key: &str, default: i32) -> ConfigResult<i32> {
        if self.contains(key) {
            self.get_i32(key)
        } else {
            Ok(default)
        }
    }

    /// 无符号计数值
    pub fn get_usize(&self, key: &str) -> ConfigResult<usize> {
        self.scalar(key)?
            .parse()
            .map_err(|_| ConfigError::BadType {
                key: key.to_string(),
                expected: "non-negative integer",
            })
    }

    /// 带默认的无符号计数值
    pub fn get_usize_or(&self, key: &str, default: usize) -> ConfigResult<usize> {
        if self.contains(key) {
            self.get_usize(key)
        } else {
            Ok(default)
        }
    }

    /// 布尔值（true/false/yes/no，大小写不敏感）
    pub fn get_bool(&self, key: &str) -> ConfigResult<bool> {
        let s = self.scalar(key)?;
        match s.to_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            _ => Err(ConfigError::UnknownValue {
                key: key.to_string(),
                value: s.to_string(),
            }),
        }
    }

    /// 带默认的布尔值
    pub fn get_bool_or(&self, key: &str, default: bool) -> ConfigResult<bool> {
        if self.contains(key) {
            self.get_bool(key)
        } else {
            Ok(default)
        }
    }

    /// 整型列表
    pub fn get_i32_list(&self, key: &str) -> ConfigResult<Vec<i32>> {
        self.values(key)?
            .iter()
            .map(|s| {
                s.parse().map_err(|_| ConfigError::BadType {
                    key: key.to_string(),
                    expected: "integer list",
                })
            })
            .collect()
    }

    /// 带默认（空）的整型列表
    pub fn get_i32_list_or_empty(&self, key: &str) -> ConfigResult<Vec<i32>> {
        if self.contains(key) {
            self.get_i32_list(key)
        } else {
            Ok(Vec::new())
        }
    }
}

/// 去除 `;;` 注释（引号内的 `;;` 保留）
fn strip_comment(line: &str) -> String {
    let mut in_quotes = false;
    let bytes = line.as_bytes();
    for i in 0..bytes.len() {
        match bytes[i] {
            b'"' => in_quotes = !in_quotes,
            b';' if !in_quotes && i + 1 < bytes.len() && bytes[i + 1] == b';' => {
                return line[..i].to_string();
            }
            _ => {}
        }
    }
    line.to_string()
}

/// 按引号分词
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                if !in_quotes {
                    // 空字符串也算一个词
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// 递归解析一个块，直到 `}` 或输入耗尽
fn parse_block<I: Iterator<Item = (usize, String)>>(
    lines: &mut I,
    depth: usize,
) -> ConfigResult<ConfigBlock> {
    let mut block = ConfigBlock::default();

    while let Some((lineno, line)) = lines.next() {
        let mut tokens = tokenize(&line);
        if tokens.is_empty() {
            continue;
        }

        if tokens.len() == 1 && tokens[0] == "}" {
            if depth == 0 {
                return Err(ConfigError::Parse {
                    line: lineno,
                    message: "unmatched '}'".to_string(),
                });
            }
            return Ok(block);
        }

        if tokens.last().map(String::as_str) == Some("{") {
            tokens.pop();
            if tokens.len() != 1 {
                return Err(ConfigError::Parse {
                    line: lineno,
                    message: "block header must be 'name {'".to_string(),
                });
            }
            let key = tokens.pop().expect("checked len above");
            let inner = parse_block(lines, depth + 1)?;
            block.entries.insert(key, ConfigValue::Block(inner));
            continue;
        }

        if tokens.len() < 2 {
            return Err(ConfigError::Parse {
                line: lineno,
                message: format!("key '{}' without value", tokens[0]),
            });
        }
        let key = tokens.remove(0);
        block.entries.insert(key, ConfigValue::Values(tokens));
    }

    if depth != 0 {
        return Err(ConfigError::Parse {
            line: 0,
            message: "unexpected end of file inside block".to_string(),
        });
    }
    Ok(block)
}

/// 展开 `#include "path"`（文本替换，递归，限制深度）
fn expand_includes(text: &str, base: &Path, depth: usize) -> ConfigResult<String> {
    const MAX_DEPTH: usize = 8;
    if depth > MAX_DEPTH {
        return Err(ConfigError::Include {
            path: String::new(),
            message: format!("include nesting deeper than {MAX_DEPTH}"),
        });
    }

    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("#include") {
            let tokens = tokenize(rest);
            if tokens.len() != 1 {
                return Err(ConfigError::Include {
                    path: rest.trim().to_string(),
                    message: "expected #include \"path\"".to_string(),
                });
            }
            let inc_path = resolve_include(&tokens[0], base);
            let inc_text =
                std::fs::read_to_string(&inc_path).map_err(|e| ConfigError::Include {
                    path: inc_path.display().to_string(),
                    message: e.to_string(),
                })?;
            let inc_base = inc_path.parent().unwrap_or_else(|| Path::new("."));
            out.push_str(&expand_includes(&inc_text, inc_base, depth + 1)?);
            out.push('\n');
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    Ok(out)
}

/// include 路径相对于包含方所在目录解析
fn resolve_include(path: &str, base: &Path) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
